// src/models/report.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::models::inventory::ProductCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupBy::Daily => "daily",
            GroupBy::Weekly => "weekly",
            GroupBy::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_by: Option<GroupBy>,
    /// Comma separated, e.g. `revenue,transactions,productivity`
    pub metrics: Option<String>,
    /// Comma separated subset of `sales,staff,inventory`
    pub data_sources: Option<String>,
    /// Comma separated employee ids, staff report only.
    pub staff_ids: Option<String>,
    /// Comma separated categories or `all`, inventory report only.
    pub categories: Option<String>,
}

/// Splits a comma separated query value, dropping blanks.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl ReportQuery {
    pub fn window(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.start_date?, self.end_date?))
    }

    pub fn metric_list(&self) -> Vec<String> {
        split_list(self.metrics.as_deref())
    }

    pub fn source_list(&self) -> Vec<String> {
        split_list(self.data_sources.as_deref())
    }

    /// Unparseable ids are ignored.
    pub fn staff_id_list(&self) -> Vec<Uuid> {
        split_list(self.staff_ids.as_deref())
            .iter()
            .filter_map(|id| Uuid::parse_str(id).ok())
            .collect()
    }

    /// `None` means every category.
    pub fn category_list(&self) -> Option<Vec<ProductCategory>> {
        let names = split_list(self.categories.as_deref());
        if names.is_empty() || names.iter().any(|n| n == "all") {
            return None;
        }
        Some(
            names
                .iter()
                .filter_map(|n| serde_json::from_value(serde_json::Value::String(n.clone())).ok())
                .collect(),
        )
    }
}

/// Metadata row persisted for every generated report.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub report_type: String,
    pub name: String,
    pub created_by: Uuid,
    pub generated_at: DateTime<Utc>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_by: Option<String>,
    pub metrics: Vec<String>,
    pub data_sources: Vec<String>,
    pub summary: serde_json::Value,
    pub sample_data: serde_json::Value,
    pub data_count: i32,
}

/// What gets stored before the row exists.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_type: &'static str,
    pub name: String,
    pub created_by: Uuid,
    pub generated_at: DateTime<Utc>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub group_by: Option<GroupBy>,
    pub metrics: Vec<String>,
    pub data_sources: Vec<String>,
    pub summary: serde_json::Value,
    pub sample_data: serde_json::Value,
    pub data_count: i32,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    pub report: Report,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecentReports {
    pub reports: Vec<Report>,
}

// ---
// Per-report rows and summaries
// ---

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePeriod {
    pub period: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevenueSummary {
    pub total_revenue: Decimal,
    pub total_quantity: i64,
    pub total_transactions: i64,
    pub average_transaction_value: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffHours {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub total_hours: f64,
    pub total_shifts: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StaffSummary {
    pub total_staff: usize,
    pub total_hours: f64,
    pub total_shifts: i64,
    pub average_hours_per_staff: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    LowStock,
    Overstock,
    Normal,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockLine {
    pub id: Uuid,
    pub product_name: String,
    pub category: ProductCategory,
    pub current_stock: i32,
    pub reorder_point: i32,
    pub max_stock: Option<i32>,
    pub cost_price: Decimal,
    pub value: Decimal,
    pub status: StockStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub total_products: usize,
    pub total_items: i64,
    pub total_value: Decimal,
    pub low_stock_items: usize,
    pub out_of_stock_items: usize,
    pub overstock_items: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialPeriod {
    pub date: String,
    pub revenue: Decimal,
    pub transactions: i64,
    pub items_sold: i64,
    pub cost_of_goods_sold: Decimal,
    pub gross_profit: Decimal,
    pub gross_margin: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    pub profit_margin: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationsDay {
    pub date: NaiveDate,
    pub shift_count: usize,
    pub staff_hours: f64,
    pub revenue: Decimal,
    pub productivity: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OperationsSummary {
    pub period_covered: usize,
    pub total_staff_hours: f64,
    pub average_productivity: f64,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CustomMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub productivity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_levels: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomRow {
    pub date: String,
    pub metrics: CustomMetrics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_trimmed() {
        assert_eq!(split_list(Some("revenue, productivity,,")), vec!["revenue", "productivity"]);
        assert!(split_list(None).is_empty());
    }

    #[test]
    fn category_filter() {
        let query = ReportQuery { categories: Some("Phones,Watches,Laptops".into()), ..Default::default() };
        assert_eq!(query.category_list(), Some(vec![ProductCategory::Phones, ProductCategory::Watches]));

        let all = ReportQuery { categories: Some("all".into()), ..Default::default() };
        assert_eq!(all.category_list(), None);
    }

    #[test]
    fn window_needs_both_ends() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let half = ReportQuery { start_date: Some(day), ..Default::default() };
        assert_eq!(half.window(), None);
        let full = ReportQuery { start_date: Some(day), end_date: Some(day), ..Default::default() };
        assert_eq!(full.window(), Some((day, day)));
    }
}
