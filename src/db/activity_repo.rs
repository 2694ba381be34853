// src/db/activity_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::activity::{NewActivity, UserActivity},
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, activity: &NewActivity) -> Result<UserActivity, AppError> {
        let row = sqlx::query_as::<_, UserActivity>(
            r#"
            INSERT INTO user_activities (id, user_id, activity_type, title, description, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(activity.user_id)
        .bind(activity.activity_type)
        .bind(&activity.title)
        .bind(&activity.description)
        .bind(&activity.metadata)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// One page of a user's activity, newest first, plus the unpaged total.
    pub async fn page_for_user(
        &self,
        user_id: Uuid,
        activity_type: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<UserActivity>, i64), AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM user_activities WHERE user_id = ");
        count.push_bind(user_id);
        if let Some(kind) = activity_type {
            count.push(" AND activity_type = ").push_bind(kind.to_string());
        }
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM user_activities WHERE user_id = ");
        qb.push_bind(user_id);
        if let Some(kind) = activity_type {
            qb.push(" AND activity_type = ").push_bind(kind.to_string());
        }
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<UserActivity>().fetch_all(&self.pool).await?;

        Ok((rows, total))
    }
}
