// src/db/target_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::target::{target_id, SalesTarget, SalesTargetPayload},
};

#[derive(Clone)]
pub struct TargetRepository {
    pool: PgPool,
}

impl TargetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_all(&self) -> Result<Vec<SalesTarget>, AppError> {
        let targets = sqlx::query_as::<_, SalesTarget>("SELECT * FROM sales_targets ORDER BY target_type, period")
            .fetch_all(&self.pool)
            .await?;
        Ok(targets)
    }

    /// Creates the target `<type>-<period>` or overwrites its amount and description.
    pub async fn upsert(&self, payload: &SalesTargetPayload, created_by: Uuid) -> Result<SalesTarget, AppError> {
        let target = sqlx::query_as::<_, SalesTarget>(
            r#"
            INSERT INTO sales_targets (id, target_type, period, amount, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                amount = EXCLUDED.amount,
                description = EXCLUDED.description,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(target_id(payload.target_type, &payload.period))
        .bind(payload.target_type)
        .bind(&payload.period)
        .bind(payload.amount)
        .bind(payload.description.as_deref().unwrap_or_default())
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(target)
    }
}
