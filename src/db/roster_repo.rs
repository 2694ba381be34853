// src/db/roster_repo.rs

use chrono::NaiveDate;
use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::roster::{EmployeeSnapshot, RosterQuery, Shift},
};

#[derive(Clone)]
pub struct RosterRepository {
    pool: PgPool,
}

impl RosterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Shift>, AppError> {
        let shift = sqlx::query_as::<_, Shift>("SELECT * FROM shifts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(shift)
    }

    pub async fn list(&self, query: &RosterQuery) -> Result<Vec<Shift>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM shifts WHERE TRUE");
        if let Some(date) = query.date {
            qb.push(" AND date = ").push_bind(date);
        }
        if let Some(start) = query.start_date {
            qb.push(" AND date >= ").push_bind(start);
        }
        if let Some(end) = query.end_date {
            qb.push(" AND date <= ").push_bind(end);
        }
        if let Some(employee) = query.employee_id {
            qb.push(" AND employee_id = ").push_bind(employee);
        }
        qb.push(" ORDER BY date ASC, start_time ASC");

        let shifts = qb.build_query_as::<Shift>().fetch_all(&self.pool).await?;
        Ok(shifts)
    }

    pub async fn list_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Shift>, AppError> {
        let shifts = sqlx::query_as::<_, Shift>(
            "SELECT * FROM shifts WHERE date >= $1 AND date <= $2 ORDER BY date ASC, start_time ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(shifts)
    }

    pub async fn count_on(&self, date: NaiveDate) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE date = $1")
            .bind(date)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create<'e, E>(
        &self,
        executor: E,
        date: NaiveDate,
        start_time: &str,
        end_time: &str,
        employee_id: Uuid,
        snapshot: &EmployeeSnapshot,
        shift_note: Option<&str>,
    ) -> Result<Shift, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(
            r#"
            INSERT INTO shifts (id, date, start_time, end_time, employee_id, employee, shift_note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(employee_id)
        .bind(Json(snapshot))
        .bind(shift_note)
        .fetch_one(executor)
        .await?;
        Ok(shift)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        date: NaiveDate,
        start_time: &str,
        end_time: &str,
        employee_id: Uuid,
        snapshot: &EmployeeSnapshot,
        shift_note: Option<&str>,
    ) -> Result<Option<Shift>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let shift = sqlx::query_as::<_, Shift>(
            r#"
            UPDATE shifts
            SET date = $2, start_time = $3, end_time = $4, employee_id = $5,
                employee = $6, shift_note = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(date)
        .bind(start_time)
        .bind(end_time)
        .bind(employee_id)
        .bind(Json(snapshot))
        .bind(shift_note)
        .fetch_optional(executor)
        .await?;
        Ok(shift)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Removes every shift of `employee_id` dated within `start..=end`,
    /// returning the removed rows.
    pub async fn delete_for_employee_between<'e, E>(
        &self,
        executor: E,
        employee_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Shift>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let removed = sqlx::query_as::<_, Shift>(
            "DELETE FROM shifts WHERE employee_id = $1 AND date >= $2 AND date <= $3 RETURNING *",
        )
        .bind(employee_id)
        .bind(start)
        .bind(end)
        .fetch_all(executor)
        .await?;
        Ok(removed)
    }
}
