// src/db/inventory_repo.rs

use sqlx::{types::Json, Executor, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::inventory::{
        CategoryValue, InventoryFilter, InventoryHistoryEntry, InventoryInput, InventoryItem,
    },
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: PgPool,
}

impl InventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Reads
    // ---

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    /// Row lock for read-modify-write stock changes.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(item)
    }

    pub async fn list(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>, AppError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM inventory WHERE TRUE");
        if let Some(category) = filter.category {
            qb.push(" AND category = ").push_bind(category);
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            qb.push(" AND (product_name ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR sku ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
        qb.push(" ORDER BY product_name ASC");

        let items = qb.build_query_as::<InventoryItem>().fetch_all(&self.pool).await?;
        Ok(items)
    }

    pub async fn list_all(&self) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory ORDER BY product_name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<InventoryItem>, AppError> {
        let items = sqlx::query_as::<_, InventoryItem>(
            "SELECT * FROM inventory WHERE current_stock <= reorder_point ORDER BY current_stock ASC, product_name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn value_by_category(&self) -> Result<Vec<CategoryValue>, AppError> {
        let rows = sqlx::query_as::<_, CategoryValue>(
            r#"
            SELECT
                category,
                COUNT(*)::BIGINT AS item_count,
                COALESCE(SUM(current_stock), 0)::BIGINT AS total_units,
                COALESCE(SUM(current_stock * cost_price), 0) AS cost_value,
                COALESCE(SUM(current_stock * selling_price), 0) AS retail_value
            FROM inventory
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn history(&self, product_id: Uuid) -> Result<Vec<InventoryHistoryEntry>, AppError> {
        let rows = sqlx::query_as::<_, InventoryHistoryEntry>(
            "SELECT * FROM inventory_history WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    // ---
    // Writes
    // ---

    pub async fn create<'e, E>(&self, executor: E, doc: &InventoryInput) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory (
                id, product_name, category, status, description, sku, current_stock,
                reorder_point, reorder_quantity, max_stock, lead_time_days, cost_price,
                selling_price, margin, weight_kg, dimensions, storage_location, date_added,
                expiration_date, images
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(doc.product_name.as_deref())
        .bind(doc.category)
        .bind(doc.status.unwrap_or_default())
        .bind(doc.description.as_deref())
        .bind(doc.sku.as_deref())
        .bind(doc.current_stock.unwrap_or(0))
        .bind(doc.reorder_point.unwrap_or(0))
        .bind(doc.reorder_quantity.unwrap_or(0))
        .bind(doc.max_stock)
        .bind(doc.lead_time_days.unwrap_or(0))
        .bind(doc.cost_price.unwrap_or_default())
        .bind(doc.selling_price.unwrap_or_default())
        .bind(doc.margin.unwrap_or_default())
        .bind(doc.weight_kg.unwrap_or_default())
        .bind(Json(doc.dimensions.clone().unwrap_or_default()))
        .bind(doc.storage_location.as_deref())
        .bind(doc.date_added)
        .bind(doc.expiration_date)
        .bind(doc.images.clone().unwrap_or_default())
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        doc: &InventoryInput,
    ) -> Result<Option<InventoryItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory SET
                product_name = $2, category = $3, status = $4, description = $5, sku = $6,
                current_stock = $7, reorder_point = $8, reorder_quantity = $9, max_stock = $10,
                lead_time_days = $11, cost_price = $12, selling_price = $13, margin = $14,
                weight_kg = $15, dimensions = $16, storage_location = $17, date_added = $18,
                expiration_date = $19, images = $20, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(doc.product_name.as_deref())
        .bind(doc.category)
        .bind(doc.status.unwrap_or_default())
        .bind(doc.description.as_deref())
        .bind(doc.sku.as_deref())
        .bind(doc.current_stock.unwrap_or(0))
        .bind(doc.reorder_point.unwrap_or(0))
        .bind(doc.reorder_quantity.unwrap_or(0))
        .bind(doc.max_stock)
        .bind(doc.lead_time_days.unwrap_or(0))
        .bind(doc.cost_price.unwrap_or_default())
        .bind(doc.selling_price.unwrap_or_default())
        .bind(doc.margin.unwrap_or_default())
        .bind(doc.weight_kg.unwrap_or_default())
        .bind(Json(doc.dimensions.clone().unwrap_or_default()))
        .bind(doc.storage_location.as_deref())
        .bind(doc.date_added)
        .bind(doc.expiration_date)
        .bind(doc.images.clone().unwrap_or_default())
        .fetch_optional(executor)
        .await?;
        Ok(item)
    }

    pub async fn set_stock<'e, E>(&self, executor: E, id: Uuid, stock: i32) -> Result<InventoryItem, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let item = sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory SET current_stock = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(stock)
        .fetch_one(executor)
        .await?;
        Ok(item)
    }

    pub async fn record_history<'e, E>(
        &self,
        executor: E,
        product_id: Uuid,
        previous_stock: i32,
        new_stock: i32,
        reason: &str,
        changed_by: Option<Uuid>,
    ) -> Result<InventoryHistoryEntry, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let entry = sqlx::query_as::<_, InventoryHistoryEntry>(
            r#"
            INSERT INTO inventory_history (id, product_id, previous_stock, new_stock, change, reason, changed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(product_id)
        .bind(previous_stock)
        .bind(new_stock)
        .bind(new_stock - previous_stock)
        .bind(reason)
        .bind(changed_by)
        .fetch_one(executor)
        .await?;
        Ok(entry)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM inventory WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
