// src/db/notification_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::notification::{Audience, Notification, NotificationInput, TargetRole},
};

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

/// Appends the visibility rule for `audience`: broadcast, its role, the user
/// directly, or its store; expired rows are excluded.
fn push_visibility(qb: &mut QueryBuilder<'_, Postgres>, audience: &Audience, now: DateTime<Utc>) {
    let roles = vec![
        TargetRole::All.as_str().to_string(),
        TargetRole::for_role(audience.role).as_str().to_string(),
    ];
    qb.push(" AND (expires_at IS NULL OR expires_at > ")
        .push_bind(now)
        .push(") AND (target_role::TEXT = ANY(")
        .push_bind(roles)
        .push(") OR ")
        .push_bind(audience.user_id)
        .push(" = ANY(target_users)");
    if let Some(store) = &audience.store_id {
        qb.push(" OR ").push_bind(store.clone()).push(" = ANY(target_stores)");
    }
    qb.push(")");
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(notification)
    }

    /// Notifications visible to `audience`, newest first.
    pub async fn visible_to(
        &self,
        audience: &Audience,
        now: DateTime<Utc>,
        unread_only: bool,
        created_after: Option<DateTime<Utc>>,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM notifications WHERE TRUE");
        push_visibility(&mut qb, audience, now);
        if unread_only {
            qb.push(" AND NOT COALESCE((read ->> ")
                .push_bind(audience.user_id.to_string())
                .push(")::BOOLEAN, FALSE)");
        }
        if let Some(after) = created_after {
            qb.push(" AND created_at > ").push_bind(after);
        }
        qb.push(" ORDER BY created_at DESC");
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }

        let rows = qb.build_query_as::<Notification>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, doc: &NotificationInput) -> Result<Notification, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (
                id, title, message, notification_type, priority, target_role, target_users,
                target_stores, action, details, created_by, created_by_name, expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(doc.title.as_deref())
        .bind(doc.message.as_deref())
        .bind(doc.notification_type.unwrap_or_default())
        .bind(doc.priority.unwrap_or_default())
        .bind(doc.target_role.unwrap_or_default())
        .bind(doc.target_users.clone().unwrap_or_default())
        .bind(doc.target_stores.clone().unwrap_or_default())
        .bind(doc.action.as_ref().map(Json))
        .bind(doc.details.as_ref())
        .bind(doc.created_by)
        .bind(doc.created_by_name.as_deref().unwrap_or("system"))
        .bind(doc.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    pub async fn mark_read(&self, id: Uuid, user_id: Uuid) -> Result<Option<Notification>, AppError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read = read || jsonb_build_object($2::TEXT, TRUE), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        Ok(notification)
    }

    /// Marks every visible, unread notification as read by the audience's user.
    pub async fn mark_all_read(&self, audience: &Audience, now: DateTime<Utc>) -> Result<u64, AppError> {
        let user_key = audience.user_id.to_string();
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE notifications SET read = read || jsonb_build_object(");
        qb.push_bind(user_key.clone())
            .push("::TEXT, TRUE), updated_at = NOW() WHERE NOT COALESCE((read ->> ")
            .push_bind(user_key)
            .push(")::BOOLEAN, FALSE)");
        push_visibility(&mut qb, audience, now);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
