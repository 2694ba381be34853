// src/models/sales.rs

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::common::validation::{money_in_range, ValidationReport};
use crate::models::aggregation::{BucketEntry, BucketTotals, SalesBucket};
use crate::models::inventory::ProductCategory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema, Default)]
#[sqlx(type_name = "payment_method")]
pub enum PaymentMethod {
    #[default]
    Cash,
    #[serde(rename = "Credit Card")]
    #[sqlx(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    #[sqlx(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "Mobile Payment")]
    #[sqlx(rename = "Mobile Payment")]
    MobilePayment,
    Other,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub transaction_id: String,
    pub product_id: String,
    pub product_name: String,
    pub category: ProductCategory,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_amount: Decimal,
    pub store_location: String,
    pub payment_method: PaymentMethod,
    pub sale_datetime: DateTime<Utc>,
    pub minute_key: String,
    pub hour_key: String,
    pub date_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ---
// Bucket keys (always UTC)
// ---

pub fn date_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

pub fn hour_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d-%H").to_string()
}

pub fn minute_key(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d-%H-%M").to_string()
}

pub fn generate_transaction_id(now: &DateTime<Utc>) -> String {
    let suffix: u32 = rand::rng().random_range(0..100_000);
    format!("TRX-{}-{}", now.timestamp_millis(), suffix)
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleInput {
    #[validate(
        required(message = "productId is required"),
        length(min = 1, message = "productId is required")
    )]
    pub product_id: Option<String>,
    #[validate(
        required(message = "productName is required"),
        length(min = 1, message = "productName is required")
    )]
    pub product_name: Option<String>,
    pub category: Option<ProductCategory>,
    #[validate(
        required(message = "quantity is required"),
        range(min = 1, max = 1_000_000, message = "quantity must be between 1 and 1000000")
    )]
    pub quantity: Option<i32>,
    #[validate(
        required(message = "unitPrice is required"),
        custom(function = "money_in_range", message = "unitPrice must be between 0 and 9999999999.99")
    )]
    pub unit_price: Option<Decimal>,
    #[validate(
        required(message = "totalAmount is required"),
        custom(function = "money_in_range", message = "totalAmount must be between 0 and 9999999999.99")
    )]
    pub total_amount: Option<Decimal>,
    #[validate(
        required(message = "storeLocation is required"),
        length(min = 1, message = "storeLocation is required")
    )]
    pub store_location: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(required(message = "saleDatetime is required"))]
    pub sale_datetime: Option<DateTime<Utc>>,
    #[validate(required(message = "dateKey is required"))]
    pub date_key: Option<String>,
    #[validate(required(message = "hourKey is required"))]
    pub hour_key: Option<String>,
    #[validate(required(message = "minuteKey is required"))]
    pub minute_key: Option<String>,
    #[validate(
        required(message = "transactionId is required"),
        length(min = 1, message = "transactionId is required")
    )]
    pub transaction_id: Option<String>,
}

impl From<&Sale> for SaleInput {
    fn from(s: &Sale) -> Self {
        Self {
            product_id: Some(s.product_id.clone()),
            product_name: Some(s.product_name.clone()),
            category: Some(s.category),
            quantity: Some(s.quantity),
            unit_price: Some(s.unit_price),
            total_amount: Some(s.total_amount),
            store_location: Some(s.store_location.clone()),
            payment_method: Some(s.payment_method),
            sale_datetime: Some(s.sale_datetime),
            date_key: Some(s.date_key.clone()),
            hour_key: Some(s.hour_key.clone()),
            minute_key: Some(s.minute_key.clone()),
            transaction_id: Some(s.transaction_id.clone()),
        }
    }
}

impl SaleInput {
    /// Overlays `patch` on a stored sale. Derived values that depend on a patched
    /// field are cleared so `prepare_sale` recomputes them.
    pub fn merge(self, patch: SaleInput) -> Self {
        let moved = patch.sale_datetime.is_some();
        let repriced = patch.quantity.is_some() || patch.unit_price.is_some();

        let keep_derived = |patched: Option<String>, stored: Option<String>| {
            if patched.is_some() {
                patched
            } else if moved {
                None
            } else {
                stored
            }
        };

        Self {
            product_id: patch.product_id.or(self.product_id),
            product_name: patch.product_name.or(self.product_name),
            category: patch.category.or(self.category),
            quantity: patch.quantity.or(self.quantity),
            unit_price: patch.unit_price.or(self.unit_price),
            total_amount: match patch.total_amount {
                Some(total) => Some(total),
                None if repriced => None,
                None => self.total_amount,
            },
            store_location: patch.store_location.or(self.store_location),
            payment_method: patch.payment_method.or(self.payment_method),
            sale_datetime: patch.sale_datetime.or(self.sale_datetime),
            date_key: keep_derived(patch.date_key, self.date_key),
            hour_key: keep_derived(patch.hour_key, self.hour_key),
            minute_key: keep_derived(patch.minute_key, self.minute_key),
            transaction_id: patch.transaction_id.or(self.transaction_id),
        }
    }
}

/// Fills defaults and derived fields: quantity 1, category Others, payment Cash,
/// saleDatetime `now`, totalAmount = round2(unitPrice × quantity) when absent,
/// the three UTC bucket keys when absent, and a generated transaction id.
pub fn prepare_sale(input: SaleInput, now: DateTime<Utc>) -> SaleInput {
    let quantity = input.quantity.unwrap_or(1);
    let sale_datetime = input.sale_datetime.unwrap_or(now);

    // An overflowing product is kept out of range so validation rejects it.
    let total_amount = input.total_amount.or_else(|| {
        input.unit_price.map(|price| {
            price
                .checked_mul(Decimal::from(quantity))
                .map(|total| total.round_dp(2))
                .unwrap_or(Decimal::MAX)
        })
    });

    // Supplied keys win; a missing hour or minute key extends whatever date key we end up with.
    let date_key = input
        .date_key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| date_key(&sale_datetime));
    let hour_key = input
        .hour_key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| format!("{}-{}", date_key, sale_datetime.format("%H")));
    let minute_key = input
        .minute_key
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| format!("{}-{}", hour_key, sale_datetime.format("%M")));

    let transaction_id = input
        .transaction_id
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| generate_transaction_id(&now));

    SaleInput {
        product_id: input.product_id.map(|p| p.trim().to_string()),
        product_name: input.product_name.map(|p| p.trim().to_string()),
        category: Some(input.category.unwrap_or(ProductCategory::Others)),
        quantity: Some(quantity),
        unit_price: input.unit_price,
        total_amount,
        store_location: input.store_location.map(|s| s.trim().to_string()),
        payment_method: Some(input.payment_method.unwrap_or_default()),
        sale_datetime: Some(sale_datetime),
        date_key: Some(date_key),
        hour_key: Some(hour_key),
        minute_key: Some(minute_key),
        transaction_id: Some(transaction_id),
    }
}

pub fn validate_sale(doc: &SaleInput) -> ValidationReport {
    ValidationReport::of(doc)
}

// ---
// Listing & analytics shapes
// ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct SalesListQuery {
    /// Inclusive lower bound on dateKey (YYYY-MM-DD)
    pub start_date: Option<String>,
    /// Inclusive upper bound on dateKey (YYYY-MM-DD)
    pub end_date: Option<String>,
    pub store_location: Option<String>,
    pub category: Option<ProductCategory>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesListMeta {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub total_amount: Decimal,
    pub total_quantity: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SalesListResponse {
    pub sales: Vec<Sale>,
    pub meta: SalesListMeta,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct KeyRangeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketDetail {
    pub key: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
    pub sales: Vec<BucketEntry>,
}

impl BucketDetail {
    /// An empty detail for keys that have no bucket yet.
    pub fn from_bucket(key: String, bucket: Option<SalesBucket>) -> Self {
        match bucket {
            Some(b) => Self {
                key,
                total_amount: b.total_amount,
                total_quantity: b.total_quantity,
                transaction_count: b.transaction_count,
                sales: b.sales.0,
            },
            None => Self {
                key,
                total_amount: Decimal::ZERO,
                total_quantity: 0,
                transaction_count: 0,
                sales: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HourlySales {
    pub hour: u32,
    pub hour_key: String,
    pub label: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
}

pub const BUSINESS_HOURS: std::ops::RangeInclusive<u32> = 10..=21;

/// One entry per business hour of `date`, zero-filled where no bucket exists.
pub fn fill_business_hours(date: &str, buckets: &[BucketTotals]) -> Vec<HourlySales> {
    BUSINESS_HOURS
        .map(|hour| {
            let key = format!("{}-{:02}", date, hour);
            let bucket = buckets.iter().find(|b| b.key == key);
            HourlySales {
                hour,
                label: format!("{:02}:00", hour),
                total_amount: bucket.map(|b| b.total_amount).unwrap_or(Decimal::ZERO),
                total_quantity: bucket.map(|b| b.total_quantity).unwrap_or(0),
                transaction_count: bucket.map(|b| b.transaction_count).unwrap_or(0),
                hour_key: key,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesBreakdown {
    pub label: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub total_revenue: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
    pub average_transaction_value: Decimal,
    pub by_category: Vec<SalesBreakdown>,
    pub by_payment_method: Vec<SalesBreakdown>,
    pub by_store: Vec<SalesBreakdown>,
}

impl SalesSummary {
    pub fn from_breakdowns(
        by_category: Vec<SalesBreakdown>,
        by_payment_method: Vec<SalesBreakdown>,
        by_store: Vec<SalesBreakdown>,
    ) -> Self {
        let total_revenue: Decimal = by_category.iter().map(|b| b.total_amount).sum();
        let total_quantity = by_category.iter().map(|b| b.total_quantity).sum();
        let transaction_count = by_category.iter().map(|b| b.transaction_count).sum();
        Self {
            total_revenue,
            total_quantity,
            transaction_count,
            average_transaction_value: average(total_revenue, transaction_count),
            by_category,
            by_payment_method,
            by_store,
        }
    }
}

pub fn average(total: Decimal, count: i64) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        (total / Decimal::from(count)).round_dp(2)
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRanking {
    pub product_id: String,
    pub product_name: String,
    pub total_quantity: i64,
    pub total_revenue: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaySnapshot {
    pub date: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
}

impl DaySnapshot {
    pub fn from_bucket(date: String, bucket: Option<&BucketTotals>) -> Self {
        Self {
            total_amount: bucket.map(|b| b.total_amount).unwrap_or(Decimal::ZERO),
            total_quantity: bucket.map(|b| b.total_quantity).unwrap_or(0),
            transaction_count: bucket.map(|b| b.transaction_count).unwrap_or(0),
            date,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesDashboard {
    pub today: DaySnapshot,
    pub yesterday: DaySnapshot,
    pub percent_change: Decimal,
    pub last_30_days: Vec<DaySnapshot>,
    pub recent_sales: Vec<Sale>,
    pub top_products: Vec<ProductRanking>,
}

/// Day-over-day change in percent. With no sales yesterday any sales today count as +100%.
pub fn percent_change(today: Decimal, yesterday: Decimal) -> Decimal {
    if yesterday.is_zero() {
        if today > Decimal::ZERO { Decimal::ONE_HUNDRED } else { Decimal::ZERO }
    } else {
        ((today - yesterday) / yesterday * Decimal::ONE_HUNDRED).round_dp(2)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportFailure {
    pub index: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkImportResult {
    pub imported: usize,
    pub failed: Vec<BulkImportFailure>,
    pub batches: usize,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkImportPayload {
    pub sales: Vec<SaleInput>,
}

/// Prepares every imported record and splits them into storable sales and
/// per-index failures.
pub fn partition_import(
    sales: Vec<SaleInput>,
    now: DateTime<Utc>,
) -> (Vec<SaleInput>, Vec<BulkImportFailure>) {
    let mut valid = Vec::new();
    let mut failed = Vec::new();
    for (index, input) in sales.into_iter().enumerate() {
        let doc = prepare_sale(input, now);
        let report = validate_sale(&doc);
        if report.valid {
            valid.push(doc);
        } else {
            failed.push(BulkImportFailure { index, errors: report.errors });
        }
    }
    (valid, failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 27).unwrap()
    }

    fn input() -> SaleInput {
        SaleInput {
            product_id: Some("p-1".into()),
            product_name: Some("Galaxy Buds".into()),
            unit_price: Some(Decimal::new(1999, 2)),
            quantity: Some(3),
            store_location: Some("Downtown".into()),
            sale_datetime: Some(at(14, 5)),
            ..Default::default()
        }
    }

    #[test]
    fn total_amount_is_rounded_product() {
        let doc = prepare_sale(input(), at(15, 0));
        assert_eq!(doc.total_amount, Some(Decimal::new(5997, 2)));
    }

    #[test]
    fn supplied_total_is_kept() {
        let doc = prepare_sale(
            SaleInput { total_amount: Some(Decimal::new(50, 0)), ..input() },
            at(15, 0),
        );
        assert_eq!(doc.total_amount, Some(Decimal::new(50, 0)));
    }

    #[test]
    fn keys_are_derived_in_utc() {
        let doc = prepare_sale(input(), at(15, 0));
        assert_eq!(doc.date_key.as_deref(), Some("2024-03-04"));
        assert_eq!(doc.hour_key.as_deref(), Some("2024-03-04-14"));
        assert_eq!(doc.minute_key.as_deref(), Some("2024-03-04-14-05"));
        assert_eq!(minute_key(&at(9, 7)), "2024-03-04-09-07");
        assert_eq!(hour_key(&at(9, 7)), "2024-03-04-09");
    }

    #[test]
    fn supplied_date_key_prefixes_derived_keys() {
        let doc = prepare_sale(
            SaleInput { date_key: Some("2024-01-01".into()), ..input() },
            at(15, 0),
        );
        assert_eq!(doc.hour_key.as_deref(), Some("2024-01-01-14"));
        assert_eq!(doc.minute_key.as_deref(), Some("2024-01-01-14-05"));
    }

    #[test]
    fn defaults_are_filled() {
        let now = at(15, 0);
        let doc = prepare_sale(
            SaleInput { quantity: None, sale_datetime: None, ..input() },
            now,
        );
        assert_eq!(doc.quantity, Some(1));
        assert_eq!(doc.category, Some(ProductCategory::Others));
        assert_eq!(doc.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(doc.sale_datetime, Some(now));
        let trx = doc.transaction_id.unwrap();
        assert!(trx.starts_with(&format!("TRX-{}-", now.timestamp_millis())));
    }

    #[test]
    fn prepared_sale_is_valid() {
        assert!(validate_sale(&prepare_sale(input(), at(15, 0))).valid);
    }

    #[test]
    fn missing_fields_and_bounds_are_reported() {
        let doc = prepare_sale(
            SaleInput {
                product_id: Some(String::new()),
                store_location: None,
                quantity: Some(0),
                unit_price: None,
                ..input()
            },
            at(15, 0),
        );
        let report = validate_sale(&doc);
        assert!(!report.valid);
        for expected in [
            "productId is required",
            "storeLocation is required",
            "quantity must be between 1 and 1000000",
            "unitPrice is required",
        ] {
            assert!(report.errors.contains(&expected.to_string()), "missing {expected}");
        }
    }

    #[test]
    fn overflowing_total_is_rejected_not_computed() {
        let huge = Decimal::from_i128_with_scale(70_000_000_000_000_000_000_000_000_000, 0);
        let doc = prepare_sale(
            SaleInput { unit_price: Some(huge), quantity: Some(2), ..input() },
            at(15, 0),
        );
        let report = validate_sale(&doc);
        assert!(!report.valid);
        assert!(report.errors.contains(&"totalAmount must be between 0 and 9999999999.99".to_string()));
    }

    #[test]
    fn amounts_must_fit_the_money_columns() {
        let doc = prepare_sale(
            SaleInput { unit_price: Some(Decimal::new(1234567890125, 1)), quantity: Some(1), ..input() },
            at(15, 0),
        );
        let report = validate_sale(&doc);
        assert!(report.errors.contains(&"unitPrice must be between 0 and 9999999999.99".to_string()));
        assert!(report.errors.contains(&"totalAmount must be between 0 and 9999999999.99".to_string()));
    }

    #[test]
    fn out_of_range_import_rows_fail_on_their_own() {
        let rows = vec![
            input(),
            SaleInput { unit_price: Some(Decimal::new(1234567890125, 1)), quantity: Some(1), ..input() },
            input(),
        ];
        let (valid, failed) = partition_import(rows, at(15, 0));
        assert_eq!(valid.len(), 2);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].index, 1);
    }

    #[test]
    fn unknown_payment_method_is_rejected() {
        let parsed = serde_json::from_value::<SaleInput>(serde_json::json!({ "paymentMethod": "Barter" }));
        assert!(parsed.is_err());
        let ok: SaleInput = serde_json::from_value(serde_json::json!({ "paymentMethod": "Mobile Payment" })).unwrap();
        assert_eq!(ok.payment_method, Some(PaymentMethod::MobilePayment));
    }

    #[test]
    fn merge_recomputes_derived_fields() {
        let stored = prepare_sale(input(), at(15, 0));
        let patch = SaleInput { quantity: Some(1), sale_datetime: Some(at(18, 30)), ..Default::default() };
        let merged = prepare_sale(stored.merge(patch), at(19, 0));
        assert_eq!(merged.total_amount, Some(Decimal::new(1999, 2)));
        assert_eq!(merged.minute_key.as_deref(), Some("2024-03-04-18-30"));
    }

    #[test]
    fn percent_change_handles_empty_yesterday() {
        assert_eq!(percent_change(Decimal::new(150, 0), Decimal::new(100, 0)), Decimal::new(50, 0));
        assert_eq!(percent_change(Decimal::new(10, 0), Decimal::ZERO), Decimal::ONE_HUNDRED);
        assert_eq!(percent_change(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(percent_change(Decimal::new(50, 0), Decimal::new(100, 0)), Decimal::new(-50, 0));
    }

    #[test]
    fn business_hours_pick_up_existing_buckets() {
        let buckets = vec![BucketTotals {
            key: "2024-03-04-14".into(),
            total_amount: Decimal::new(5997, 2),
            total_quantity: 3,
            transaction_count: 1,
        }];
        let hours = fill_business_hours("2024-03-04", &buckets);
        let two_pm = hours.iter().find(|h| h.hour == 14).unwrap();
        assert_eq!(two_pm.transaction_count, 1);
        assert_eq!(two_pm.total_amount, Decimal::new(5997, 2));
        assert_eq!(hours.iter().filter(|h| h.transaction_count > 0).count(), 1);
    }

    #[test]
    fn business_hours_are_zero_filled() {
        let hours = fill_business_hours("2024-03-04", &[]);
        assert_eq!(hours.len(), 12);
        assert_eq!(hours[0].hour_key, "2024-03-04-10");
        assert_eq!(hours[11].label, "21:00");
        assert!(hours.iter().all(|h| h.transaction_count == 0));
    }
}
