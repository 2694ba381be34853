// src/models/inventory.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{money_in_range, not_negative, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "product_category")]
pub enum ProductCategory {
    Phones,
    Tabs,
    Watches,
    Earbuds,
    Others,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "product_status")]
pub enum ProductStatus {
    #[default]
    Active,
    Discontinued,
    #[serde(rename = "Out of Stock")]
    #[sqlx(rename = "Out of Stock")]
    OutOfStock,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct Dimensions {
    pub length: Decimal,
    pub width: Decimal,
    pub height: Decimal,
    pub unit: String,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            length: Decimal::ZERO,
            width: Decimal::ZERO,
            height: Decimal::ZERO,
            unit: "cm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: Uuid,
    pub product_name: String,
    pub category: ProductCategory,
    pub status: ProductStatus,
    pub description: Option<String>,
    pub sku: Option<String>,
    pub current_stock: i32,
    pub reorder_point: i32,
    pub reorder_quantity: i32,
    pub max_stock: Option<i32>,
    pub lead_time_days: i32,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub margin: Decimal,
    pub weight_kg: Decimal,
    #[schema(value_type = Dimensions)]
    pub dimensions: Json<Dimensions>,
    pub storage_location: Option<String>,
    pub date_added: DateTime<Utc>,
    pub expiration_date: Option<NaiveDate>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.reorder_point
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryInput {
    #[validate(
        required(message = "productName is required"),
        length(min = 1, message = "productName is required")
    )]
    pub product_name: Option<String>,
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    pub description: Option<String>,
    pub sku: Option<String>,
    #[validate(range(min = 0, message = "currentStock must be at least 0"))]
    pub current_stock: Option<i32>,
    #[validate(range(min = 0, message = "reorderPoint must be at least 0"))]
    pub reorder_point: Option<i32>,
    #[validate(range(min = 0, message = "reorderQuantity must be at least 0"))]
    pub reorder_quantity: Option<i32>,
    #[validate(range(min = 0, message = "maxStock must be at least 0"))]
    pub max_stock: Option<i32>,
    #[validate(range(min = 0, message = "leadTimeDays must be at least 0"))]
    pub lead_time_days: Option<i32>,
    #[validate(custom(function = "money_in_range", message = "costPrice must be between 0 and 9999999999.99"))]
    pub cost_price: Option<Decimal>,
    #[validate(custom(function = "money_in_range", message = "sellingPrice must be between 0 and 9999999999.99"))]
    pub selling_price: Option<Decimal>,
    #[validate(custom(function = "money_in_range", message = "margin must be between 0 and 9999999999.99"))]
    pub margin: Option<Decimal>,
    #[validate(custom(function = "not_negative", message = "weightKg must be at least 0"))]
    pub weight_kg: Option<Decimal>,
    pub dimensions: Option<Dimensions>,
    pub storage_location: Option<String>,
    pub date_added: Option<DateTime<Utc>>,
    pub expiration_date: Option<NaiveDate>,
    pub images: Option<Vec<String>>,
}

impl From<&InventoryItem> for InventoryInput {
    fn from(item: &InventoryItem) -> Self {
        Self {
            product_name: Some(item.product_name.clone()),
            category: Some(item.category),
            status: Some(item.status),
            description: item.description.clone(),
            sku: item.sku.clone(),
            current_stock: Some(item.current_stock),
            reorder_point: Some(item.reorder_point),
            reorder_quantity: Some(item.reorder_quantity),
            max_stock: item.max_stock,
            lead_time_days: Some(item.lead_time_days),
            cost_price: Some(item.cost_price),
            selling_price: Some(item.selling_price),
            margin: Some(item.margin),
            weight_kg: Some(item.weight_kg),
            dimensions: Some(item.dimensions.0.clone()),
            storage_location: item.storage_location.clone(),
            date_added: Some(item.date_added),
            expiration_date: item.expiration_date,
            images: Some(item.images.clone()),
        }
    }
}

impl InventoryInput {
    pub fn merge(self, patch: InventoryInput) -> Self {
        Self {
            product_name: patch.product_name.or(self.product_name),
            category: patch.category.or(self.category),
            status: patch.status.or(self.status),
            description: patch.description.or(self.description),
            sku: patch.sku.or(self.sku),
            current_stock: patch.current_stock.or(self.current_stock),
            reorder_point: patch.reorder_point.or(self.reorder_point),
            reorder_quantity: patch.reorder_quantity.or(self.reorder_quantity),
            max_stock: patch.max_stock.or(self.max_stock),
            lead_time_days: patch.lead_time_days.or(self.lead_time_days),
            cost_price: patch.cost_price.or(self.cost_price),
            selling_price: patch.selling_price.or(self.selling_price),
            margin: patch.margin.or(self.margin),
            weight_kg: patch.weight_kg.or(self.weight_kg),
            dimensions: patch.dimensions.or(self.dimensions),
            storage_location: patch.storage_location.or(self.storage_location),
            date_added: patch.date_added.or(self.date_added),
            expiration_date: patch.expiration_date.or(self.expiration_date),
            images: patch.images.or(self.images),
        }
    }
}

pub fn prepare_inventory(input: InventoryInput, now: DateTime<Utc>) -> InventoryInput {
    InventoryInput {
        product_name: input.product_name.map(|n| n.trim().to_string()),
        category: Some(input.category.unwrap_or(ProductCategory::Phones)),
        status: Some(input.status.unwrap_or_default()),
        current_stock: Some(input.current_stock.unwrap_or(0)),
        reorder_point: Some(input.reorder_point.unwrap_or(0)),
        reorder_quantity: Some(input.reorder_quantity.unwrap_or(0)),
        lead_time_days: Some(input.lead_time_days.unwrap_or(0)),
        cost_price: Some(input.cost_price.unwrap_or(Decimal::ZERO)),
        selling_price: Some(input.selling_price.unwrap_or(Decimal::ZERO)),
        margin: Some(input.margin.unwrap_or(Decimal::ZERO)),
        weight_kg: Some(input.weight_kg.unwrap_or(Decimal::ZERO)),
        dimensions: Some(input.dimensions.unwrap_or_default()),
        date_added: Some(input.date_added.unwrap_or(now)),
        images: Some(input.images.unwrap_or_default()),
        ..input
    }
}

pub fn validate_inventory(doc: &InventoryInput) -> ValidationReport {
    ValidationReport::of(doc)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StockOperation {
    Set,
    Add,
    Subtract,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockPayload {
    #[validate(range(min = 0, message = "quantity must be at least 0"))]
    pub quantity: i32,
    pub operation: Option<StockOperation>,
    pub reason: Option<String>,
}

/// New stock level after applying `operation`; `None` if it would go negative.
pub fn apply_stock_operation(current: i32, operation: StockOperation, quantity: i32) -> Option<i32> {
    let next = match operation {
        StockOperation::Set => quantity,
        StockOperation::Add => current.checked_add(quantity)?,
        StockOperation::Subtract => current.checked_sub(quantity)?,
    };
    (next >= 0).then_some(next)
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryHistoryEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub previous_stock: i32,
    pub new_stock: i32,
    pub change: i32,
    pub reason: String,
    pub changed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct InventoryFilter {
    pub category: Option<ProductCategory>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryValue {
    pub category: ProductCategory,
    pub item_count: i64,
    pub total_units: i64,
    pub cost_value: Decimal,
    pub retail_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryValue {
    pub total_items: i64,
    pub total_units: i64,
    pub total_cost_value: Decimal,
    pub total_retail_value: Decimal,
    pub potential_profit: Decimal,
    pub by_category: Vec<CategoryValue>,
}

impl InventoryValue {
    pub fn from_categories(by_category: Vec<CategoryValue>) -> Self {
        let total_items = by_category.iter().map(|c| c.item_count).sum();
        let total_units = by_category.iter().map(|c| c.total_units).sum();
        let total_cost_value: Decimal = by_category.iter().map(|c| c.cost_value).sum();
        let total_retail_value: Decimal = by_category.iter().map(|c| c.retail_value).sum();
        Self {
            total_items,
            total_units,
            total_cost_value,
            total_retail_value,
            potential_profit: total_retail_value - total_cost_value,
            by_category,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn item(name: &str, stock: i32, reorder: i32) -> InventoryItem {
        InventoryItem {
            id: Uuid::new_v4(),
            product_name: name.into(),
            category: ProductCategory::Phones,
            status: ProductStatus::Active,
            description: None,
            sku: None,
            current_stock: stock,
            reorder_point: reorder,
            reorder_quantity: 10,
            max_stock: None,
            lead_time_days: 3,
            cost_price: Decimal::new(100, 0),
            selling_price: Decimal::new(150, 0),
            margin: Decimal::new(50, 0),
            weight_kg: Decimal::ZERO,
            dimensions: Json(Dimensions::default()),
            storage_location: None,
            date_added: Utc::now(),
            expiration_date: None,
            images: Vec::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_fills_numeric_and_physical_defaults() {
        let now = Utc::now();
        let doc = prepare_inventory(
            InventoryInput { product_name: Some(" Pixel 8 ".into()), ..Default::default() },
            now,
        );
        assert_eq!(doc.product_name.as_deref(), Some("Pixel 8"));
        assert_eq!(doc.category, Some(ProductCategory::Phones));
        assert_eq!(doc.status, Some(ProductStatus::Active));
        assert_eq!(doc.current_stock, Some(0));
        assert_eq!(doc.dimensions.as_ref().map(|d| d.unit.as_str()), Some("cm"));
        assert_eq!(doc.date_added, Some(now));
        assert!(validate_inventory(&doc).valid);
    }

    #[test]
    fn negative_values_are_reported() {
        let doc = prepare_inventory(
            InventoryInput {
                product_name: Some("Watch".into()),
                current_stock: Some(-1),
                cost_price: Some(Decimal::new(-500, 2)),
                ..Default::default()
            },
            Utc::now(),
        );
        let report = validate_inventory(&doc);
        assert!(report.errors.contains(&"currentStock must be at least 0".to_string()));
        assert!(report.errors.contains(&"costPrice must be between 0 and 9999999999.99".to_string()));
    }

    #[test]
    fn out_of_stock_status_spelling() {
        let status: ProductStatus = serde_json::from_str("\"Out of Stock\"").unwrap();
        assert_eq!(status, ProductStatus::OutOfStock);
        assert!(serde_json::from_str::<ProductCategory>("\"Laptops\"").is_err());
    }

    #[test]
    fn stock_operations_never_go_negative() {
        assert_eq!(apply_stock_operation(10, StockOperation::Add, 5), Some(15));
        assert_eq!(apply_stock_operation(10, StockOperation::Subtract, 4), Some(6));
        assert_eq!(apply_stock_operation(3, StockOperation::Subtract, 4), None);
        assert_eq!(apply_stock_operation(3, StockOperation::Set, 40), Some(40));
    }

    #[test]
    fn value_totals_sum_categories() {
        let value = InventoryValue::from_categories(vec![
            CategoryValue {
                category: ProductCategory::Phones,
                item_count: 2,
                total_units: 10,
                cost_value: Decimal::new(1000, 0),
                retail_value: Decimal::new(1500, 0),
            },
            CategoryValue {
                category: ProductCategory::Watches,
                item_count: 1,
                total_units: 4,
                cost_value: Decimal::new(200, 0),
                retail_value: Decimal::new(320, 0),
            },
        ]);
        assert_eq!(value.total_items, 3);
        assert_eq!(value.total_units, 14);
        assert_eq!(value.potential_profit, Decimal::new(620, 0));
    }
}
