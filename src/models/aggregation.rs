// src/models/aggregation.rs

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::inventory::ProductCategory;
use crate::models::sales::{PaymentMethod, Sale};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketGranularity {
    Minute,
    Hour,
    Date,
}

impl BucketGranularity {
    pub const ALL: [BucketGranularity; 3] =
        [BucketGranularity::Minute, BucketGranularity::Hour, BucketGranularity::Date];

    pub fn table(self) -> &'static str {
        match self {
            BucketGranularity::Minute => "sales_by_minute",
            BucketGranularity::Hour => "sales_by_hour",
            BucketGranularity::Date => "sales_by_date",
        }
    }

    pub fn key_of(self, sale: &Sale) -> &str {
        match self {
            BucketGranularity::Minute => &sale.minute_key,
            BucketGranularity::Hour => &sale.hour_key,
            BucketGranularity::Date => &sale.date_key,
        }
    }
}

/// Compact copy of a sale kept inside each bucket it contributes to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BucketEntry {
    pub sale_id: Uuid,
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
}

impl From<&Sale> for BucketEntry {
    fn from(s: &Sale) -> Self {
        Self {
            sale_id: s.id,
            transaction_id: s.transaction_id.clone(),
            product_id: s.product_id.clone(),
            product_name: s.product_name.clone(),
            category: s.category,
            quantity: s.quantity,
            unit_price: s.unit_price,
            total_amount: s.total_amount,
            store_location: s.store_location.clone(),
            payment_method: s.payment_method,
            sale_datetime: s.sale_datetime,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesBucket {
    pub bucket_key: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
    #[schema(value_type = Vec<BucketEntry>)]
    pub sales: Json<Vec<BucketEntry>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bucket totals without the entry list, for range listings.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BucketTotals {
    pub key: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
}

/// Everything one batch contributes to a single bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketDelta {
    pub granularity: BucketGranularity,
    pub key: String,
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
    pub entries: Vec<BucketEntry>,
}

/// Groups `sales` by minute, hour and date key: one delta per distinct
/// (granularity, key), ordered by granularity then key. Fails when a
/// bucket total would overflow.
pub fn plan_bucket_updates(sales: &[Sale]) -> Result<Vec<BucketDelta>, AppError> {
    let mut plan: BTreeMap<(BucketGranularity, String), BucketDelta> = BTreeMap::new();

    for sale in sales {
        for granularity in BucketGranularity::ALL {
            let key = granularity.key_of(sale).to_string();
            let delta = plan
                .entry((granularity, key.clone()))
                .or_insert_with(|| BucketDelta {
                    granularity,
                    key,
                    total_amount: Decimal::ZERO,
                    total_quantity: 0,
                    transaction_count: 0,
                    entries: Vec::new(),
                });
            delta.total_amount = delta
                .total_amount
                .checked_add(sale.total_amount)
                .ok_or_else(|| AppError::bad_request("totalAmount is out of range"))?;
            delta.total_quantity += i64::from(sale.quantity);
            delta.transaction_count += 1;
            delta.entries.push(BucketEntry::from(sale));
        }
    }

    Ok(plan.into_values().collect())
}

/// Bucket state after taking some sales back out of it.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRemoval {
    pub total_amount: Decimal,
    pub total_quantity: i64,
    pub transaction_count: i64,
    pub remaining: Vec<BucketEntry>,
    pub removed: usize,
}

/// Subtracts the contribution of every entry whose sale id is in `sale_ids`.
/// Returns `None` when the bucket holds none of them, so a sale can never be
/// removed twice and a missing bucket is never driven negative.
pub fn remove_entries(bucket: &SalesBucket, sale_ids: &HashSet<Uuid>) -> Option<BucketRemoval> {
    let (removed, remaining): (Vec<&BucketEntry>, Vec<&BucketEntry>) =
        bucket.sales.0.iter().partition(|e| sale_ids.contains(&e.sale_id));

    if removed.is_empty() {
        return None;
    }

    let amount: Decimal = removed.iter().map(|e| e.total_amount).sum();
    let quantity: i64 = removed.iter().map(|e| i64::from(e.quantity)).sum();

    Some(BucketRemoval {
        total_amount: (bucket.total_amount - amount).max(Decimal::ZERO),
        total_quantity: (bucket.total_quantity - quantity).max(0),
        transaction_count: (bucket.transaction_count - removed.len() as i64).max(0),
        remaining: remaining.into_iter().cloned().collect(),
        removed: removed.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sale(minute: u32, unit_price: i64, quantity: i32) -> Sale {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 11, minute, 0).unwrap();
        let total = Decimal::from(unit_price) * Decimal::from(quantity);
        Sale {
            id: Uuid::new_v4(),
            transaction_id: format!("TRX-{}", minute),
            product_id: "p-1".into(),
            product_name: "Tab S9".into(),
            category: ProductCategory::Tabs,
            quantity,
            unit_price: Decimal::from(unit_price),
            total_amount: total,
            store_location: "Mall".into(),
            payment_method: PaymentMethod::Cash,
            sale_datetime: at,
            minute_key: at.format("%Y-%m-%d-%H-%M").to_string(),
            hour_key: at.format("%Y-%m-%d-%H").to_string(),
            date_key: at.format("%Y-%m-%d").to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn bucket_from(delta: &BucketDelta) -> SalesBucket {
        SalesBucket {
            bucket_key: delta.key.clone(),
            total_amount: delta.total_amount,
            total_quantity: delta.total_quantity,
            transaction_count: delta.transaction_count,
            sales: Json(delta.entries.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn two_sales_in_one_minute_share_a_bucket() {
        let plan = plan_bucket_updates(&[sale(5, 10, 2), sale(5, 10, 2)]).unwrap();
        assert_eq!(plan.len(), 3);

        let minute = &plan[0];
        assert_eq!(minute.granularity, BucketGranularity::Minute);
        assert_eq!(minute.key, "2024-03-04-11-05");
        assert_eq!(minute.total_amount, Decimal::from(40));
        assert_eq!(minute.total_quantity, 4);
        assert_eq!(minute.transaction_count, 2);
        assert_eq!(minute.entries.len(), 2);
    }

    #[test]
    fn distinct_minutes_fan_out_but_share_hour_and_date() {
        let sales: Vec<Sale> = (0..5).map(|m| sale(m, 3, 1)).collect();
        let plan = plan_bucket_updates(&sales).unwrap();

        let minutes = plan.iter().filter(|d| d.granularity == BucketGranularity::Minute).count();
        assert_eq!(minutes, 5);

        let date = plan.iter().find(|d| d.granularity == BucketGranularity::Date).unwrap();
        assert_eq!(date.transaction_count, 5);
        assert_eq!(date.total_amount, Decimal::from(15));
    }

    #[test]
    fn overflowing_bucket_total_is_a_bad_request() {
        let mut huge = sale(5, 1, 1);
        huge.total_amount = Decimal::MAX;
        let result = plan_bucket_updates(&[huge.clone(), huge]);
        assert!(matches!(result, Err(AppError::BadRequest(m)) if m == "totalAmount is out of range"));
    }

    #[test]
    fn empty_batch_plans_nothing() {
        assert!(plan_bucket_updates(&[]).unwrap().is_empty());
    }

    #[test]
    fn removal_subtracts_only_matching_entries() {
        let first = sale(5, 10, 2);
        let second = sale(5, 7, 1);
        let plan = plan_bucket_updates(&[first.clone(), second.clone()]).unwrap();
        let bucket = bucket_from(&plan[0]);

        let removal = remove_entries(&bucket, &HashSet::from([first.id])).unwrap();
        assert_eq!(removal.total_amount, Decimal::from(7));
        assert_eq!(removal.total_quantity, 1);
        assert_eq!(removal.transaction_count, 1);
        assert_eq!(removal.remaining.len(), 1);
        assert_eq!(removal.remaining[0].sale_id, second.id);
    }

    #[test]
    fn removing_an_absent_sale_is_a_no_op() {
        let plan = plan_bucket_updates(&[sale(5, 10, 2)]).unwrap();
        let bucket = bucket_from(&plan[0]);
        assert!(remove_entries(&bucket, &HashSet::from([Uuid::new_v4()])).is_none());
    }

    #[test]
    fn table_names_follow_granularity() {
        assert_eq!(BucketGranularity::Minute.table(), "sales_by_minute");
        assert_eq!(BucketGranularity::Date.table(), "sales_by_date");
    }
}
