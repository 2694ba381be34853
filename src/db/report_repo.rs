// src/db/report_repo.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::report::{NewReport, Report},
};

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, report: &NewReport) -> Result<Report, AppError> {
        let row = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (
                id, report_type, name, created_by, generated_at, start_date, end_date,
                group_by, metrics, data_sources, summary, sample_data, data_count
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(report.report_type)
        .bind(&report.name)
        .bind(report.created_by)
        .bind(report.generated_at)
        .bind(report.start_date)
        .bind(report.end_date)
        .bind(report.group_by.map(|g| g.as_str()))
        .bind(&report.metrics)
        .bind(&report.data_sources)
        .bind(&report.summary)
        .bind(&report.sample_data)
        .bind(report.data_count)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Most recent reports, optionally only those created by one employee.
    pub async fn recent(&self, created_by: Option<Uuid>, limit: i64) -> Result<Vec<Report>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM reports WHERE TRUE");
        if let Some(owner) = created_by {
            qb.push(" AND created_by = ").push_bind(owner);
        }
        qb.push(" ORDER BY generated_at DESC LIMIT ").push_bind(limit);
        let rows = qb.build_query_as::<Report>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}
