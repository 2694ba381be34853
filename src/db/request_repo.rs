// src/db/request_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::Role,
        request::{
            ProcessedBy, RequestComment, RequestInput, RequestQuery, RequestScope, RequestStatus,
            StaffRequest,
        },
    },
};

#[derive(Clone)]
pub struct RequestRepository {
    pool: PgPool,
}

impl RequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<StaffRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StaffRequest>("SELECT * FROM requests WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<StaffRequest>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let request = sqlx::query_as::<_, StaffRequest>("SELECT * FROM requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(request)
    }

    pub async fn list(&self, query: &RequestQuery, scope: RequestScope) -> Result<Vec<StaffRequest>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM requests WHERE TRUE");
        match scope {
            RequestScope::All => {}
            RequestScope::Own(id) => {
                qb.push(" AND requester_id = ").push_bind(id);
            }
            RequestScope::OwnAndStaff(id) => {
                qb.push(" AND (requester_id = ")
                    .push_bind(id)
                    .push(" OR requester_role = ")
                    .push_bind(Role::Staff)
                    .push(")");
            }
            RequestScope::StaffOnly => {
                qb.push(" AND requester_role = ").push_bind(Role::Staff);
            }
        }
        if let Some(status) = query.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(kind) = query.request_type {
            qb.push(" AND request_type = ").push_bind(kind);
        }
        if let Some(start) = query.start_date {
            qb.push(" AND start_date >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            qb.push(" AND end_date <= ").push_bind(end);
        }
        qb.push(" ORDER BY created_at DESC");

        let rows = qb.build_query_as::<StaffRequest>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn create(&self, doc: &RequestInput) -> Result<StaffRequest, AppError> {
        let request = sqlx::query_as::<_, StaffRequest>(
            r#"
            INSERT INTO requests (
                id, request_type, requester_id, requester_name, requester_role, start_date,
                end_date, store_id, store_name, leave_reason, staff_assignments
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(doc.request_type)
        .bind(doc.requester_id)
        .bind(doc.requester_name.as_deref())
        .bind(doc.requester_role)
        .bind(doc.start_date)
        .bind(doc.end_date)
        .bind(doc.store_id.as_deref())
        .bind(doc.store_name.as_deref())
        .bind(doc.leave_reason.as_deref())
        .bind(Json(doc.staff_assignments.clone().unwrap_or_default()))
        .fetch_one(&self.pool)
        .await?;
        Ok(request)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: RequestStatus,
        processed_by: &ProcessedBy,
        processed_date: DateTime<Utc>,
        decision_notes: Option<&str>,
        comment: Option<&RequestComment>,
    ) -> Result<StaffRequest, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let comments = Json(comment.map(|c| vec![c]).unwrap_or_default());
        let request = sqlx::query_as::<_, StaffRequest>(
            r#"
            UPDATE requests SET
                status = $2, processed_by = $3, processed_date = $4,
                decision_notes = COALESCE($5, decision_notes),
                comments = comments || $6::JSONB,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(Json(processed_by))
        .bind(processed_date)
        .bind(decision_notes)
        .bind(comments)
        .fetch_one(executor)
        .await?;
        Ok(request)
    }

    pub async fn add_comment(&self, id: Uuid, comment: &RequestComment) -> Result<Option<StaffRequest>, AppError> {
        let request = sqlx::query_as::<_, StaffRequest>(
            r#"
            UPDATE requests
            SET comments = comments || jsonb_build_array($2::JSONB), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(comment))
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
