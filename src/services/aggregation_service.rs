// src/services/aggregation_service.rs

use std::collections::{BTreeMap, HashSet};

use futures::stream::{self, StreamExt};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::AggregationRepository,
    models::{
        aggregation::{plan_bucket_updates, remove_entries, BucketDelta, BucketGranularity},
        sales::Sale,
    },
};

/// Upper bound on bucket transactions in flight for one batch.
pub const MAX_CONCURRENT_BUCKET_WRITES: usize = 10;

/// Sale ids to take out of one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct BucketRemovalPlan {
    pub granularity: BucketGranularity,
    pub key: String,
    pub sale_ids: HashSet<Uuid>,
}

/// Groups the ids of `sales` by every bucket they contributed to.
pub fn plan_bucket_removals(sales: &[Sale]) -> Vec<BucketRemovalPlan> {
    let mut plan: BTreeMap<(BucketGranularity, String), HashSet<Uuid>> = BTreeMap::new();
    for sale in sales {
        for granularity in BucketGranularity::ALL {
            plan.entry((granularity, granularity.key_of(sale).to_string()))
                .or_default()
                .insert(sale.id);
        }
    }
    plan.into_iter()
        .map(|((granularity, key), sale_ids)| BucketRemovalPlan { granularity, key, sale_ids })
        .collect()
}

#[derive(Clone)]
pub struct AggregationService {
    aggregation_repo: AggregationRepository,
    pool: PgPool,
}

impl AggregationService {
    pub fn new(aggregation_repo: AggregationRepository, pool: PgPool) -> Self {
        Self { aggregation_repo, pool }
    }

    /// Adds `sales` to their minute, hour and date buckets. Returns the
    /// number of buckets written.
    pub async fn apply(&self, sales: &[Sale]) -> Result<usize, AppError> {
        if sales.is_empty() {
            return Ok(0);
        }

        let plan = plan_bucket_updates(sales)?;
        let written = plan.len();

        let results: Vec<Result<(), AppError>> = stream::iter(plan.iter())
            .map(|delta| self.apply_delta(delta))
            .buffer_unordered(MAX_CONCURRENT_BUCKET_WRITES)
            .boxed()
            .collect()
            .await;
        results.into_iter().collect::<Result<Vec<()>, AppError>>()?;

        tracing::debug!("Aggregated {} sales into {} buckets", sales.len(), written);
        Ok(written)
    }

    async fn apply_delta(&self, delta: &BucketDelta) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        self.aggregation_repo.upsert_delta(&mut *tx, delta).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Takes `sales` back out of their buckets. Buckets that do not hold a
    /// sale are left alone. Returns the number of buckets changed.
    pub async fn remove(&self, sales: &[Sale]) -> Result<usize, AppError> {
        if sales.is_empty() {
            return Ok(0);
        }

        let plan = plan_bucket_removals(sales);
        let results: Vec<Result<bool, AppError>> = stream::iter(plan.iter())
            .map(|bucket| self.remove_from_bucket(bucket))
            .buffer_unordered(MAX_CONCURRENT_BUCKET_WRITES)
            .boxed()
            .collect()
            .await;

        let mut changed = 0;
        for result in results {
            if result? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn remove_from_bucket(&self, plan: &BucketRemovalPlan) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        let Some(bucket) = self
            .aggregation_repo
            .lock(&mut *tx, plan.granularity, &plan.key)
            .await?
        else {
            tracing::warn!(
                "Skipping removal from {} bucket {}: bucket does not exist",
                plan.granularity.table(),
                plan.key
            );
            return Ok(false);
        };

        let Some(removal) = remove_entries(&bucket, &plan.sale_ids) else {
            tracing::warn!(
                "Skipping removal from {} bucket {}: no matching sale entries",
                plan.granularity.table(),
                plan.key
            );
            return Ok(false);
        };

        self.aggregation_repo
            .write_removal(&mut *tx, plan.granularity, &plan.key, &removal)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::ProductCategory;
    use crate::models::sales::PaymentMethod;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn sale(minute: u32) -> Sale {
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 14, minute, 0).unwrap();
        Sale {
            id: Uuid::new_v4(),
            transaction_id: format!("TRX-{minute}"),
            product_id: "p-1".into(),
            product_name: "Galaxy Buds".into(),
            category: ProductCategory::Earbuds,
            quantity: 2,
            unit_price: Decimal::new(10, 0),
            total_amount: Decimal::new(20, 0),
            store_location: "Downtown".into(),
            payment_method: PaymentMethod::Cash,
            sale_datetime: at,
            minute_key: at.format("%Y-%m-%d-%H-%M").to_string(),
            hour_key: at.format("%Y-%m-%d-%H").to_string(),
            date_key: at.format("%Y-%m-%d").to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn removal_plan_touches_each_bucket_once() {
        let sales = vec![sale(5), sale(5), sale(6)];
        let plan = plan_bucket_removals(&sales);

        // two minutes, one hour, one date
        assert_eq!(plan.len(), 4);
        let hour = plan
            .iter()
            .find(|p| p.granularity == BucketGranularity::Hour)
            .unwrap();
        assert_eq!(hour.key, "2024-03-04-14");
        assert_eq!(hour.sale_ids.len(), 3);

        let first_minute = plan
            .iter()
            .find(|p| p.key == "2024-03-04-14-05")
            .unwrap();
        assert!(first_minute.sale_ids.contains(&sales[0].id));
        assert!(first_minute.sale_ids.contains(&sales[1].id));
        assert!(!first_minute.sale_ids.contains(&sales[2].id));
    }

    #[test]
    fn empty_batches_plan_nothing() {
        assert!(plan_bucket_removals(&[]).is_empty());
    }
}
