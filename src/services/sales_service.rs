// src/services/sales_service.rs

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::{AggregationRepository, SalesDimension, SalesRepository, TargetRepository},
    models::{
        aggregation::{BucketGranularity, BucketTotals},
        sales::{
            date_key, fill_business_hours, partition_import, percent_change, prepare_sale, validate_sale,
            BucketDetail, BulkImportPayload, BulkImportResult, DateRangeQuery,
            DaySnapshot, HourlySales, KeyRangeQuery, ProductRanking, Sale, SaleInput,
            SalesDashboard, SalesListMeta, SalesListQuery, SalesListResponse, SalesSummary,
        },
        target::{
            achievement_percentage, overlapping_period, period_range, target_id, SalesTargetPayload,
            TargetOverview, TargetProgress, TargetSaved,
        },
    },
    services::{aggregation_service::AggregationService, inventory_service::InventoryService},
};

const SALE_NOT_FOUND: &str = "Sale not found";

/// Rows written per bulk-import transaction.
pub const IMPORT_CHUNK_SIZE: usize = 500;

const DEFAULT_LIST_LIMIT: i64 = 100;
const DASHBOARD_DAYS: u64 = 30;

#[derive(Clone)]
pub struct SalesService {
    sales_repo: SalesRepository,
    aggregation_repo: AggregationRepository,
    target_repo: TargetRepository,
    inventory: InventoryService,
    aggregation: AggregationService,
    pool: PgPool,
}

impl SalesService {
    pub fn new(
        sales_repo: SalesRepository,
        aggregation_repo: AggregationRepository,
        target_repo: TargetRepository,
        inventory: InventoryService,
        aggregation: AggregationService,
        pool: PgPool,
    ) -> Self {
        Self { sales_repo, aggregation_repo, target_repo, inventory, aggregation, pool }
    }

    // --- ADD SALE ---
    // Stock is taken and the sale written in one transaction; the buckets
    // are updated once that has committed.
    pub async fn add_sale(&self, input: SaleInput, actor: Uuid) -> Result<Sale, AppError> {
        let doc = prepare_sale(input, Utc::now());
        validate_sale(&doc).into_result()?;

        let product_id = doc
            .product_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .ok_or_else(|| AppError::not_found("Inventory item not found"))?;
        let quantity = doc.quantity.unwrap_or(1);
        let transaction_id = doc.transaction_id.clone().unwrap_or_default();

        let mut tx = self.pool.begin().await?;
        self.inventory
            .deduct_for_sale(&mut tx, product_id, quantity, &transaction_id, Some(actor))
            .await?;
        let sale = self.sales_repo.create(&mut *tx, &doc).await?;
        tx.commit().await?;

        self.aggregation.apply(std::slice::from_ref(&sale)).await?;
        tracing::info!("Sale {} recorded for {}", sale.transaction_id, sale.product_name);
        Ok(sale)
    }

    pub async fn list_sales(&self, query: &SalesListQuery) -> Result<SalesListResponse, AppError> {
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, 1000);
        let offset = query.offset.unwrap_or(0).max(0);

        let sales = self.sales_repo.list(query, limit, offset).await?;
        let totals = self.sales_repo.totals(query).await?;

        Ok(SalesListResponse {
            sales,
            meta: SalesListMeta {
                total: totals.total,
                limit,
                offset,
                total_amount: totals.total_amount,
                total_quantity: totals.total_quantity,
            },
        })
    }

    pub async fn get_sale(&self, id: Uuid) -> Result<Sale, AppError> {
        self.sales_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(SALE_NOT_FOUND))
    }

    // --- UPDATE SALE ---
    // The old contribution leaves its buckets and the new one is added, so
    // moving a sale in time or changing its amount keeps every bucket exact.
    // The row lock is held until the buckets are rewritten, so concurrent
    // updates of one sale run one after the other.
    pub async fn update_sale(&self, id: Uuid, patch: SaleInput) -> Result<Sale, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored = self
            .sales_repo
            .lock_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::not_found(SALE_NOT_FOUND))?;

        let doc = prepare_sale(SaleInput::from(&stored).merge(patch), Utc::now());
        validate_sale(&doc).into_result()?;

        let updated = self
            .sales_repo
            .update(&mut *tx, id, &doc)
            .await?
            .ok_or_else(|| AppError::not_found(SALE_NOT_FOUND))?;

        self.aggregation.remove(std::slice::from_ref(&stored)).await?;
        self.aggregation.apply(std::slice::from_ref(&updated)).await?;
        tx.commit().await?;
        Ok(updated)
    }

    // --- DELETE SALE ---
    pub async fn delete_sale(&self, id: Uuid) -> Result<(), AppError> {
        let sale = self
            .sales_repo
            .delete(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::not_found(SALE_NOT_FOUND))?;

        self.aggregation.remove(std::slice::from_ref(&sale)).await?;
        tracing::info!("Sale {} deleted", sale.transaction_id);
        Ok(())
    }

    // --- BULK IMPORT ---
    // Invalid rows are reported back by index and never written. Valid rows
    // go in chunks, each chunk in its own transaction and then aggregated.
    // Imported sales are historical, so stock is left untouched.
    pub async fn bulk_import(&self, payload: BulkImportPayload) -> Result<BulkImportResult, AppError> {
        let (valid, failed) = partition_import(payload.sales, Utc::now());

        let mut imported = 0;
        let mut batches = 0;
        for chunk in valid.chunks(IMPORT_CHUNK_SIZE) {
            let mut tx = self.pool.begin().await?;
            let sales = self.sales_repo.create_many(&mut *tx, chunk).await?;
            tx.commit().await?;

            self.aggregation.apply(&sales).await?;
            imported += sales.len();
            batches += 1;
            tracing::info!("Imported batch {} with {} sales", batches, sales.len());
        }

        if !failed.is_empty() {
            tracing::warn!("Bulk import skipped {} invalid records", failed.len());
        }

        Ok(BulkImportResult { imported, failed, batches })
    }

    // ---
    // Analytics
    // ---

    pub async fn buckets(
        &self,
        granularity: BucketGranularity,
        query: &KeyRangeQuery,
    ) -> Result<Vec<BucketTotals>, AppError> {
        self.aggregation_repo
            .range(granularity, query.start_date.as_deref(), query.end_date.as_deref(), true)
            .await
    }

    pub async fn bucket_detail(&self, granularity: BucketGranularity, key: &str) -> Result<BucketDetail, AppError> {
        let bucket = self.aggregation_repo.find(granularity, key).await?;
        Ok(BucketDetail::from_bucket(key.to_string(), bucket))
    }

    pub async fn hourly(&self, date: NaiveDate) -> Result<Vec<HourlySales>, AppError> {
        let day = date.format("%Y-%m-%d").to_string();
        let buckets = self
            .aggregation_repo
            .range(BucketGranularity::Hour, Some(&day), Some(&day), false)
            .await?;
        Ok(fill_business_hours(&day, &buckets))
    }

    pub async fn summary(&self, query: &DateRangeQuery) -> Result<SalesSummary, AppError> {
        let (start, end) = (query.start_date, query.end_date);
        let by_category = self.sales_repo.breakdown(SalesDimension::Category, start, end).await?;
        let by_payment = self.sales_repo.breakdown(SalesDimension::PaymentMethod, start, end).await?;
        let by_store = self.sales_repo.breakdown(SalesDimension::Store, start, end).await?;
        Ok(SalesSummary::from_breakdowns(by_category, by_payment, by_store))
    }

    pub async fn product_ranking(&self, query: &DateRangeQuery) -> Result<Vec<ProductRanking>, AppError> {
        let limit = query.limit.unwrap_or(10).clamp(1, 100);
        self.sales_repo
            .product_ranking(query.start_date, query.end_date, limit)
            .await
    }

    pub async fn dashboard(&self) -> Result<SalesDashboard, AppError> {
        let now = Utc::now();
        let today = now.date_naive();
        let yesterday = today.pred_opt().unwrap_or(today);
        let window_start = today.checked_sub_days(Days::new(DASHBOARD_DAYS - 1)).unwrap_or(today);

        let today_key = date_key(&now);
        let yesterday_key = yesterday.format("%Y-%m-%d").to_string();
        let start_key = window_start.format("%Y-%m-%d").to_string();

        let days = self
            .aggregation_repo
            .range(BucketGranularity::Date, Some(&start_key), Some(&today_key), false)
            .await?;
        let find = |key: &str| days.iter().find(|b| b.key == key);

        let today_snapshot = DaySnapshot::from_bucket(today_key.clone(), find(&today_key));
        let yesterday_snapshot = DaySnapshot::from_bucket(yesterday_key.clone(), find(&yesterday_key));
        let change = percent_change(today_snapshot.total_amount, yesterday_snapshot.total_amount);

        let last_30_days = days
            .iter()
            .map(|b| DaySnapshot::from_bucket(b.key.clone(), Some(b)))
            .collect();

        let recent_sales = self.sales_repo.recent(10).await?;
        let top_products = self
            .sales_repo
            .product_ranking(Some(window_start), Some(today), 5)
            .await?;

        Ok(SalesDashboard {
            today: today_snapshot,
            yesterday: yesterday_snapshot,
            percent_change: change,
            last_30_days,
            recent_sales,
            top_products,
        })
    }

    // ---
    // Targets
    // ---

    /// Every target overlapping `start..=end`, with what the date buckets
    /// show was sold over the target's whole period.
    pub async fn targets_overlapping(&self, start: NaiveDate, end: NaiveDate) -> Result<TargetOverview, AppError> {
        let mut summary = BTreeMap::new();
        let mut all_targets = Vec::new();

        for target in self.target_repo.list_all().await? {
            let Some((from, to)) = overlapping_period(&target, start, end) else {
                continue;
            };

            let achieved = self.sold_between(from, to).await?;
            summary.insert(
                target.id.clone(),
                TargetProgress {
                    id: target.id.clone(),
                    target_type: target.target_type,
                    period: target.period.clone(),
                    start_date: from,
                    end_date: to,
                    target_amount: target.amount,
                    achieved,
                    percentage: achievement_percentage(achieved, target.amount),
                    description: target.description.clone(),
                },
            );
            all_targets.push(target);
        }

        Ok(TargetOverview { summary, all_targets })
    }

    async fn sold_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Decimal, AppError> {
        let from = from.format("%Y-%m-%d").to_string();
        let to = to.format("%Y-%m-%d").to_string();
        let days = self
            .aggregation_repo
            .range(BucketGranularity::Date, Some(&from), Some(&to), false)
            .await?;
        Ok(days.iter().map(|d| d.total_amount).sum())
    }

    pub async fn save_target(&self, payload: &SalesTargetPayload, actor: Uuid) -> Result<TargetSaved, AppError> {
        payload.validate()?;
        if period_range(payload.target_type, &payload.period).is_none() {
            return Err(AppError::ValidationError(vec![format!(
                "period '{}' does not match a {} target",
                payload.period,
                payload.target_type.as_str()
            )]));
        }

        let target = self.target_repo.upsert(payload, actor).await?;
        tracing::info!("Sales target {} saved", target.id);
        Ok(TargetSaved {
            message: "Sales target updated successfully".to_string(),
            id: target_id(target.target_type, &target.period),
        })
    }
}
