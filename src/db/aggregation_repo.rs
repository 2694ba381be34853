// src/db/aggregation_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres};

use crate::{
    common::error::AppError,
    models::aggregation::{BucketDelta, BucketGranularity, BucketRemoval, BucketTotals, SalesBucket},
};

/// SQL over the three bucket tables. The table name always comes from
/// `BucketGranularity::table`, never from input.
#[derive(Clone)]
pub struct AggregationRepository {
    pool: PgPool,
}

impl AggregationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the bucket or adds the delta to it. Entries already present
    /// in the bucket are not appended a second time.
    pub async fn upsert_delta<'e, E>(&self, executor: E, delta: &BucketDelta) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            INSERT INTO {table} AS b (bucket_key, total_amount, total_quantity, transaction_count, sales)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (bucket_key) DO UPDATE SET
                total_amount = b.total_amount + EXCLUDED.total_amount,
                total_quantity = b.total_quantity + EXCLUDED.total_quantity,
                transaction_count = b.transaction_count + EXCLUDED.transaction_count,
                sales = b.sales || COALESCE(
                    (SELECT jsonb_agg(e)
                     FROM jsonb_array_elements(EXCLUDED.sales) AS e
                     WHERE NOT b.sales @> jsonb_build_array(e)),
                    '[]'::jsonb
                ),
                updated_at = NOW()
            "#,
            table = delta.granularity.table()
        );

        sqlx::query(&sql)
            .bind(&delta.key)
            .bind(delta.total_amount)
            .bind(delta.total_quantity)
            .bind(delta.transaction_count)
            .bind(Json(&delta.entries))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn lock<'e, E>(
        &self,
        executor: E,
        granularity: BucketGranularity,
        key: &str,
    ) -> Result<Option<SalesBucket>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!("SELECT * FROM {} WHERE bucket_key = $1 FOR UPDATE", granularity.table());
        let bucket = sqlx::query_as::<_, SalesBucket>(&sql)
            .bind(key)
            .fetch_optional(executor)
            .await?;
        Ok(bucket)
    }

    pub async fn write_removal<'e, E>(
        &self,
        executor: E,
        granularity: BucketGranularity,
        key: &str,
        removal: &BucketRemoval,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            r#"
            UPDATE {}
            SET total_amount = $2, total_quantity = $3, transaction_count = $4,
                sales = $5, updated_at = NOW()
            WHERE bucket_key = $1
            "#,
            granularity.table()
        );
        sqlx::query(&sql)
            .bind(key)
            .bind(removal.total_amount)
            .bind(removal.total_quantity)
            .bind(removal.transaction_count)
            .bind(Json(&removal.remaining))
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn find(&self, granularity: BucketGranularity, key: &str) -> Result<Option<SalesBucket>, AppError> {
        let sql = format!("SELECT * FROM {} WHERE bucket_key = $1", granularity.table());
        let bucket = sqlx::query_as::<_, SalesBucket>(&sql)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(bucket)
    }

    /// Buckets between two key prefixes, both inclusive: an end of
    /// `2024-03-04` also matches `2024-03-04-23-59`.
    pub async fn range(
        &self,
        granularity: BucketGranularity,
        start: Option<&str>,
        end: Option<&str>,
        descending: bool,
    ) -> Result<Vec<BucketTotals>, AppError> {
        let sql = format!(
            r#"
            SELECT bucket_key AS key, total_amount, total_quantity, transaction_count
            FROM {}
            WHERE ($1::TEXT IS NULL OR bucket_key >= $1)
              AND ($2::TEXT IS NULL OR bucket_key <= $2::TEXT || '~')
            ORDER BY bucket_key {}
            "#,
            granularity.table(),
            if descending { "DESC" } else { "ASC" }
        );
        let rows = sqlx::query_as::<_, BucketTotals>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Full buckets, entries included, between two key prefixes.
    pub async fn range_with_entries(
        &self,
        granularity: BucketGranularity,
        start: &str,
        end: &str,
    ) -> Result<Vec<SalesBucket>, AppError> {
        let sql = format!(
            "SELECT * FROM {} WHERE bucket_key >= $1 AND bucket_key <= $2::TEXT || '~' ORDER BY bucket_key ASC",
            granularity.table()
        );
        let rows = sqlx::query_as::<_, SalesBucket>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
