// src/db/sales_repo.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::sales::{ProductRanking, Sale, SaleInput, SalesBreakdown, SalesListQuery},
};

const LOCK_SALE_SQL: &str = "SELECT * FROM sales WHERE id = $1 FOR UPDATE";

/// Column a sales summary is grouped by.
#[derive(Debug, Clone, Copy)]
pub enum SalesDimension {
    Category,
    PaymentMethod,
    Store,
}

impl SalesDimension {
    fn column(self) -> &'static str {
        match self {
            SalesDimension::Category => "category::TEXT",
            SalesDimension::PaymentMethod => "payment_method::TEXT",
            SalesDimension::Store => "store_location",
        }
    }
}

#[derive(Debug, FromRow)]
pub struct SalesTotals {
    pub total: i64,
    pub total_amount: Decimal,
    pub total_quantity: i64,
}

#[derive(Clone)]
pub struct SalesRepository {
    pool: PgPool,
}

fn push_list_filters(qb: &mut QueryBuilder<'_, Postgres>, query: &SalesListQuery) {
    if let Some(start) = query.start_date.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND date_key >= ").push_bind(start.to_string());
    }
    if let Some(end) = query.end_date.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND date_key <= ").push_bind(end.to_string());
    }
    if let Some(store) = query.store_location.as_deref().filter(|s| !s.is_empty()) {
        qb.push(" AND store_location = ").push_bind(store.to_string());
    }
    if let Some(category) = query.category {
        qb.push(" AND category = ").push_bind(category);
    }
}

fn push_date_range(qb: &mut QueryBuilder<'_, Postgres>, start: Option<NaiveDate>, end: Option<NaiveDate>) {
    if let Some(start) = start {
        qb.push(" AND date_key >= ").push_bind(start.format("%Y-%m-%d").to_string());
    }
    if let Some(end) = end {
        qb.push(" AND date_key <= ").push_bind(end.format("%Y-%m-%d").to_string());
    }
}

impl SalesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    /// Reads a sale and holds its row lock until the transaction ends.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(LOCK_SALE_SQL)
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }

    pub async fn list(&self, query: &SalesListQuery, limit: i64, offset: i64) -> Result<Vec<Sale>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM sales WHERE TRUE");
        push_list_filters(&mut qb, query);
        qb.push(" ORDER BY date_key DESC, sale_datetime DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    /// Count and sums over every sale matching the list filters, ignoring paging.
    pub async fn totals(&self, query: &SalesListQuery) -> Result<SalesTotals, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT COUNT(*)::BIGINT AS total,
                      COALESCE(SUM(total_amount), 0) AS total_amount,
                      COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity
               FROM sales WHERE TRUE"#,
        );
        push_list_filters(&mut qb, query);
        let totals = qb.build_query_as::<SalesTotals>().fetch_one(&self.pool).await?;
        Ok(totals)
    }

    pub async fn list_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Sale>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM sales WHERE TRUE");
        push_date_range(&mut qb, Some(start), Some(end));
        qb.push(" ORDER BY sale_datetime ASC");
        let sales = qb.build_query_as::<Sale>().fetch_all(&self.pool).await?;
        Ok(sales)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<Sale>, AppError> {
        let sales = sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY sale_datetime DESC LIMIT $1")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn breakdown(
        &self,
        dimension: SalesDimension,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<SalesBreakdown>, AppError> {
        let column = dimension.column();
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            r#"SELECT {column} AS label,
                      COALESCE(SUM(total_amount), 0) AS total_amount,
                      COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity,
                      COUNT(*)::BIGINT AS transaction_count
               FROM sales WHERE TRUE"#
        ));
        push_date_range(&mut qb, start, end);
        qb.push(format!(" GROUP BY {column} ORDER BY total_amount DESC"));

        let rows = qb.build_query_as::<SalesBreakdown>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn product_ranking(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        limit: i64,
    ) -> Result<Vec<ProductRanking>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT product_id,
                      MAX(product_name) AS product_name,
                      COALESCE(SUM(quantity), 0)::BIGINT AS total_quantity,
                      COALESCE(SUM(total_amount), 0) AS total_revenue,
                      COUNT(*)::BIGINT AS transaction_count
               FROM sales WHERE TRUE"#,
        );
        push_date_range(&mut qb, start, end);
        qb.push(" GROUP BY product_id ORDER BY total_revenue DESC, product_id ASC LIMIT ")
            .push_bind(limit);

        let rows = qb.build_query_as::<ProductRanking>().fetch_all(&self.pool).await?;
        Ok(rows)
    }

    pub async fn create<'e, E>(&self, executor: E, doc: &SaleInput) -> Result<Sale, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            INSERT INTO sales (
                id, transaction_id, product_id, product_name, category, quantity, unit_price,
                total_amount, store_location, payment_method, sale_datetime, minute_key,
                hour_key, date_key
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(doc.transaction_id.as_deref())
        .bind(doc.product_id.as_deref())
        .bind(doc.product_name.as_deref())
        .bind(doc.category)
        .bind(doc.quantity)
        .bind(doc.unit_price)
        .bind(doc.total_amount)
        .bind(doc.store_location.as_deref())
        .bind(doc.payment_method.unwrap_or_default())
        .bind(doc.sale_datetime)
        .bind(doc.minute_key.as_deref())
        .bind(doc.hour_key.as_deref())
        .bind(doc.date_key.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(sale)
    }

    /// Multi-row insert of prepared and validated documents.
    pub async fn create_many<'e, E>(&self, executor: E, docs: &[SaleInput]) -> Result<Vec<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Postgres>::new(
            r#"INSERT INTO sales (
                id, transaction_id, product_id, product_name, category, quantity, unit_price,
                total_amount, store_location, payment_method, sale_datetime, minute_key,
                hour_key, date_key
            ) "#,
        );
        qb.push_values(docs, |mut row, doc| {
            row.push_bind(Uuid::new_v4())
                .push_bind(doc.transaction_id.clone())
                .push_bind(doc.product_id.clone())
                .push_bind(doc.product_name.clone())
                .push_bind(doc.category)
                .push_bind(doc.quantity)
                .push_bind(doc.unit_price)
                .push_bind(doc.total_amount)
                .push_bind(doc.store_location.clone())
                .push_bind(doc.payment_method.unwrap_or_default())
                .push_bind(doc.sale_datetime)
                .push_bind(doc.minute_key.clone())
                .push_bind(doc.hour_key.clone())
                .push_bind(doc.date_key.clone());
        });
        qb.push(" RETURNING *");

        let sales = qb.build_query_as::<Sale>().fetch_all(executor).await?;
        Ok(sales)
    }

    pub async fn update<'e, E>(&self, executor: E, id: Uuid, doc: &SaleInput) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            UPDATE sales SET
                transaction_id = $2, product_id = $3, product_name = $4, category = $5,
                quantity = $6, unit_price = $7, total_amount = $8, store_location = $9,
                payment_method = $10, sale_datetime = $11, minute_key = $12, hour_key = $13,
                date_key = $14, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(doc.transaction_id.as_deref())
        .bind(doc.product_id.as_deref())
        .bind(doc.product_name.as_deref())
        .bind(doc.category)
        .bind(doc.quantity)
        .bind(doc.unit_price)
        .bind(doc.total_amount)
        .bind(doc.store_location.as_deref())
        .bind(doc.payment_method.unwrap_or_default())
        .bind(doc.sale_datetime)
        .bind(doc.minute_key.as_deref())
        .bind(doc.hour_key.as_deref())
        .bind(doc.date_key.as_deref())
        .fetch_optional(executor)
        .await?;
        Ok(sale)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Sale>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sale = sqlx::query_as::<_, Sale>("DELETE FROM sales WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_lock_takes_a_row_lock() {
        assert!(LOCK_SALE_SQL.ends_with("FOR UPDATE"));
        assert!(LOCK_SALE_SQL.contains("WHERE id = $1"));
    }
}
