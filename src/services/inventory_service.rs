// src/services/inventory_service.rs

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::InventoryRepository,
    models::inventory::{
        apply_stock_operation, prepare_inventory, validate_inventory, InventoryFilter,
        InventoryHistoryEntry, InventoryInput, InventoryItem, InventoryValue, StockOperation,
        UpdateStockPayload,
    },
};

const ITEM_NOT_FOUND: &str = "Inventory item not found";

#[derive(Clone)]
pub struct InventoryService {
    inventory_repo: InventoryRepository,
    pool: PgPool,
}

impl InventoryService {
    pub fn new(inventory_repo: InventoryRepository, pool: PgPool) -> Self {
        Self { inventory_repo, pool }
    }

    // --- CREATE ITEM ---
    pub async fn create_item(&self, input: InventoryInput, actor: Uuid) -> Result<InventoryItem, AppError> {
        let doc = prepare_inventory(input, Utc::now());
        validate_inventory(&doc).into_result()?;

        let mut tx = self.pool.begin().await?;
        let item = self.inventory_repo.create(&mut *tx, &doc).await?;

        if item.current_stock > 0 {
            self.inventory_repo
                .record_history(&mut *tx, item.id, 0, item.current_stock, "Initial stock", Some(actor))
                .await?;
        }

        tx.commit().await?;
        tracing::info!("Inventory item created: {} ({})", item.product_name, item.id);
        Ok(item)
    }

    pub async fn list_items(&self, filter: &InventoryFilter) -> Result<Vec<InventoryItem>, AppError> {
        self.inventory_repo.list(filter).await
    }

    pub async fn get_item(&self, id: Uuid) -> Result<InventoryItem, AppError> {
        self.inventory_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))
    }

    pub async fn low_stock(&self) -> Result<Vec<InventoryItem>, AppError> {
        self.inventory_repo.list_low_stock().await
    }

    pub async fn value(&self) -> Result<InventoryValue, AppError> {
        let by_category = self.inventory_repo.value_by_category().await?;
        Ok(InventoryValue::from_categories(by_category))
    }

    // --- UPDATE ITEM ---
    // Patch over the stored item, re-prepared and re-validated. A changed
    // stock level is written to the history like any other movement.
    pub async fn update_item(
        &self,
        id: Uuid,
        patch: InventoryInput,
        actor: Uuid,
    ) -> Result<InventoryItem, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

        let doc = prepare_inventory(InventoryInput::from(&stored).merge(patch), Utc::now());
        validate_inventory(&doc).into_result()?;

        let updated = self
            .inventory_repo
            .update(&mut *tx, id, &doc)
            .await?
            .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

        if updated.current_stock != stored.current_stock {
            self.inventory_repo
                .record_history(
                    &mut *tx,
                    id,
                    stored.current_stock,
                    updated.current_stock,
                    "Item updated",
                    Some(actor),
                )
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }

    // --- UPDATE STOCK ---
    pub async fn update_stock(
        &self,
        id: Uuid,
        payload: UpdateStockPayload,
        actor: Uuid,
    ) -> Result<InventoryItem, AppError> {
        let operation = payload.operation.unwrap_or(StockOperation::Set);
        let mut tx = self.pool.begin().await?;

        let item = self
            .inventory_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

        let new_stock = apply_stock_operation(item.current_stock, operation, payload.quantity)
            .ok_or_else(|| AppError::bad_request("Stock cannot be negative"))?;

        let updated = self.inventory_repo.set_stock(&mut *tx, id, new_stock).await?;
        let reason = payload
            .reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "Manual stock update".to_string());
        self.inventory_repo
            .record_history(&mut *tx, id, item.current_stock, new_stock, &reason, Some(actor))
            .await?;

        tx.commit().await?;
        tracing::info!(
            "Stock for {} changed from {} to {}",
            updated.product_name,
            item.current_stock,
            new_stock
        );
        Ok(updated)
    }

    /// Takes `quantity` units out of stock for a sale, inside the caller's
    /// transaction. Fails with `InsufficientStock` rather than going negative.
    pub async fn deduct_for_sale(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        quantity: i32,
        transaction_id: &str,
        actor: Option<Uuid>,
    ) -> Result<InventoryItem, AppError> {
        let item = self
            .inventory_repo
            .lock_by_id(&mut **tx, product_id)
            .await?
            .ok_or_else(|| AppError::not_found(ITEM_NOT_FOUND))?;

        let new_stock = apply_stock_operation(item.current_stock, StockOperation::Subtract, quantity)
            .ok_or(AppError::InsufficientStock {
                available: item.current_stock,
                requested: quantity,
            })?;

        let updated = self.inventory_repo.set_stock(&mut **tx, product_id, new_stock).await?;
        self.inventory_repo
            .record_history(
                &mut **tx,
                product_id,
                item.current_stock,
                new_stock,
                &format!("Sale {}", transaction_id),
                actor,
            )
            .await?;
        Ok(updated)
    }

    pub async fn history(&self, id: Uuid) -> Result<Vec<InventoryHistoryEntry>, AppError> {
        self.get_item(id).await?;
        self.inventory_repo.history(id).await
    }

    // --- DELETE ITEM ---
    pub async fn delete_item(&self, id: Uuid) -> Result<(), AppError> {
        if !self.inventory_repo.delete(id).await? {
            return Err(AppError::not_found(ITEM_NOT_FOUND));
        }
        Ok(())
    }
}
