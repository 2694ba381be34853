// src/services/report_service.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Context;
use chrono::{Datelike, Days, NaiveDate, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AggregationRepository, EmployeeRepository, InventoryRepository, ReportRepository, RosterRepository},
    models::{
        activity::{NewActivity, ACTIVITY_REPORT_VIEW},
        aggregation::{BucketGranularity, BucketTotals, SalesBucket},
        inventory::InventoryItem,
        report::{
            CustomMetrics, CustomRow, FinancialPeriod, FinancialSummary, GroupBy, NewReport,
            OperationsDay, OperationsSummary, RecentReports, ReportQuery, ReportResponse,
            RevenuePeriod, RevenueSummary, StaffHours, StaffSummary, StockLine, StockStatus,
            StockSummary,
        },
        roster::Shift,
        staff::{Employee, EmployeeFilter},
    },
    services::activity_service::ActivityService,
};

const RECENT_REPORTS: i64 = 10;
const SAMPLE_ROWS: usize = 3;

pub fn ensure_can_generate(actor: &Employee) -> Result<(), AppError> {
    if actor.role.is_management() {
        Ok(())
    } else {
        Err(AppError::forbidden("Only managers and administrators can generate reports"))
    }
}

fn required_window(query: &ReportQuery) -> Result<(NaiveDate, NaiveDate), AppError> {
    query
        .window()
        .ok_or_else(|| AppError::bad_request("Start date and end date are required"))
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

// ---
// Row builders
// ---

/// Period a date bucket falls in: the day itself, the Monday starting its
/// week, or `YYYY-MM`.
pub fn period_key(date_key: &str, group_by: GroupBy) -> String {
    let Ok(date) = NaiveDate::parse_from_str(date_key, "%Y-%m-%d") else {
        return date_key.to_string();
    };
    match group_by {
        GroupBy::Daily => day_key(date),
        GroupBy::Weekly => {
            let back = Days::new(u64::from(date.weekday().num_days_from_monday()));
            day_key(date.checked_sub_days(back).unwrap_or(date))
        }
        GroupBy::Monthly => format!("{}-{:02}", date.year(), date.month()),
    }
}

pub fn revenue_by_period(days: &[BucketTotals], group_by: GroupBy) -> Vec<RevenuePeriod> {
    let mut grouped: BTreeMap<String, RevenuePeriod> = BTreeMap::new();
    for day in days {
        let period = period_key(&day.key, group_by);
        let row = grouped.entry(period.clone()).or_insert_with(|| RevenuePeriod {
            period,
            total_amount: Decimal::ZERO,
            total_quantity: 0,
            transaction_count: 0,
        });
        row.total_amount += day.total_amount;
        row.total_quantity += day.total_quantity;
        row.transaction_count += day.transaction_count;
    }
    grouped.into_values().collect()
}

pub fn revenue_summary(rows: &[RevenuePeriod]) -> RevenueSummary {
    let total_revenue: Decimal = rows.iter().map(|r| r.total_amount).sum();
    let total_quantity = rows.iter().map(|r| r.total_quantity).sum();
    let total_transactions: i64 = rows.iter().map(|r| r.transaction_count).sum();
    let average_transaction_value = if total_transactions > 0 {
        (total_revenue / Decimal::from(total_transactions)).round_dp(2)
    } else {
        Decimal::ZERO
    };
    RevenueSummary { total_revenue, total_quantity, total_transactions, average_transaction_value }
}

/// One line per employee, in the order given; shifts of anyone else are
/// ignored.
pub fn staff_hours(staff: &[Employee], shifts: &[Shift]) -> Vec<StaffHours> {
    let mut lines: Vec<StaffHours> = staff
        .iter()
        .map(|e| StaffHours {
            id: e.id,
            name: e.full_name(),
            role: e.role.as_str().to_string(),
            total_hours: 0.0,
            total_shifts: 0,
        })
        .collect();
    let index: HashMap<Uuid, usize> = lines.iter().enumerate().map(|(i, l)| (l.id, i)).collect();

    for shift in shifts {
        if let Some(&i) = index.get(&shift.employee_id) {
            lines[i].total_hours += shift.hours();
            lines[i].total_shifts += 1;
        }
    }
    lines
}

pub fn staff_summary(lines: &[StaffHours]) -> StaffSummary {
    let total_hours: f64 = lines.iter().map(|l| l.total_hours).sum();
    let total_shifts = lines.iter().map(|l| l.total_shifts).sum();
    let average_hours_per_staff = if lines.is_empty() { 0.0 } else { total_hours / lines.len() as f64 };
    StaffSummary { total_staff: lines.len(), total_hours, total_shifts, average_hours_per_staff }
}

/// Items without a `max_stock` are never overstocked.
pub fn stock_status(item: &InventoryItem) -> StockStatus {
    if item.current_stock <= 0 {
        StockStatus::OutOfStock
    } else if item.current_stock <= item.reorder_point {
        StockStatus::LowStock
    } else if item.max_stock.is_some_and(|max| item.current_stock > max) {
        StockStatus::Overstock
    } else {
        StockStatus::Normal
    }
}

pub fn stock_lines(items: &[InventoryItem]) -> Vec<StockLine> {
    items
        .iter()
        .map(|item| StockLine {
            id: item.id,
            product_name: item.product_name.clone(),
            category: item.category,
            current_stock: item.current_stock,
            reorder_point: item.reorder_point,
            max_stock: item.max_stock,
            cost_price: item.cost_price,
            value: item.cost_price * Decimal::from(item.current_stock.max(0)),
            status: stock_status(item),
        })
        .collect()
}

pub fn stock_summary(lines: &[StockLine]) -> StockSummary {
    let count = |status: StockStatus| lines.iter().filter(|l| l.status == status).count();
    StockSummary {
        total_products: lines.len(),
        total_items: lines.iter().map(|l| i64::from(l.current_stock.max(0))).sum(),
        total_value: lines.iter().map(|l| l.value).sum(),
        low_stock_items: count(StockStatus::LowStock),
        out_of_stock_items: count(StockStatus::OutOfStock),
        overstock_items: count(StockStatus::Overstock),
    }
}

fn margin_percent(profit: Decimal, revenue: Decimal) -> Decimal {
    if revenue > Decimal::ZERO {
        (profit / revenue * Decimal::ONE_HUNDRED).round_dp(2)
    } else {
        Decimal::ZERO
    }
}

/// Profit per day: cost of goods is the cost price of each sold product
/// times its quantity. Products no longer in inventory cost nothing.
pub fn financial_periods(days: &[SalesBucket], items: &[InventoryItem]) -> Vec<FinancialPeriod> {
    let cost_of: HashMap<String, Decimal> = items.iter().map(|i| (i.id.to_string(), i.cost_price)).collect();

    days.iter()
        .map(|day| {
            let cost_of_goods_sold: Decimal = day
                .sales
                .iter()
                .filter_map(|entry| cost_of.get(&entry.product_id).map(|c| *c * Decimal::from(entry.quantity)))
                .sum();
            let gross_profit = day.total_amount - cost_of_goods_sold;
            FinancialPeriod {
                date: day.bucket_key.clone(),
                revenue: day.total_amount,
                transactions: day.transaction_count,
                items_sold: day.total_quantity,
                cost_of_goods_sold,
                gross_profit,
                gross_margin: margin_percent(gross_profit, day.total_amount),
            }
        })
        .collect()
}

pub fn financial_summary(rows: &[FinancialPeriod]) -> FinancialSummary {
    let total_revenue: Decimal = rows.iter().map(|r| r.revenue).sum();
    let total_cost = rows.iter().map(|r| r.cost_of_goods_sold).sum();
    let total_profit: Decimal = rows.iter().map(|r| r.gross_profit).sum();
    FinancialSummary {
        total_revenue,
        total_cost,
        total_profit,
        profit_margin: margin_percent(total_profit, total_revenue),
    }
}

/// One row per rostered day. Productivity is revenue per staffed hour.
pub fn operations_days(shifts: &[Shift], days: &[BucketTotals]) -> Vec<OperationsDay> {
    let revenue: HashMap<&str, Decimal> = days.iter().map(|d| (d.key.as_str(), d.total_amount)).collect();

    let mut by_date: BTreeMap<NaiveDate, (usize, f64)> = BTreeMap::new();
    for shift in shifts {
        let entry = by_date.entry(shift.date).or_default();
        entry.0 += 1;
        entry.1 += shift.hours();
    }

    by_date
        .into_iter()
        .map(|(date, (shift_count, staff_hours))| {
            let revenue = revenue.get(day_key(date).as_str()).copied().unwrap_or_default();
            let productivity = if staff_hours > 0.0 { as_f64(revenue) / staff_hours } else { 0.0 };
            OperationsDay { date, shift_count, staff_hours, revenue, productivity }
        })
        .collect()
}

pub fn operations_summary(rows: &[OperationsDay]) -> OperationsSummary {
    let days = rows.len().max(1) as f64;
    OperationsSummary {
        period_covered: rows.len(),
        total_staff_hours: rows.iter().map(|r| r.staff_hours).sum(),
        average_productivity: rows.iter().map(|r| r.productivity).sum::<f64>() / days,
    }
}

/// Sources a custom report draws from. `None` means not requested.
#[derive(Debug, Default)]
pub struct CustomSources<'a> {
    pub sales: Option<&'a [BucketTotals]>,
    pub shifts: Option<&'a [Shift]>,
    pub inventory: Option<&'a [InventoryItem]>,
}

/// Daily rows over every day with sales or shifts. Each metric is filled
/// only when asked for and its source was requested.
pub fn custom_rows(metrics: &[String], sources: &CustomSources<'_>) -> Vec<CustomRow> {
    let wants = |name: &str| metrics.iter().any(|m| m == name);
    let mut rows: BTreeMap<String, CustomMetrics> = BTreeMap::new();

    if let Some(days) = sources.sales {
        for day in days {
            let m = rows.entry(day.key.clone()).or_default();
            if wants("revenue") {
                m.revenue = Some(day.total_amount);
            }
            if wants("transactions") {
                m.transactions = Some(day.transaction_count);
            }
            if wants("quantity") {
                m.quantity = Some(day.total_quantity);
            }
        }
    }

    let mut hours: BTreeMap<String, f64> = BTreeMap::new();
    if let Some(shifts) = sources.shifts {
        for shift in shifts {
            *hours.entry(day_key(shift.date)).or_default() += shift.hours();
        }
        for (date, staffed) in &hours {
            let m = rows.entry(date.clone()).or_default();
            if wants("staff_hours") {
                m.staff_hours = Some(*staffed);
            }
        }
    }

    if wants("productivity") {
        if let (Some(days), Some(_)) = (sources.sales, sources.shifts) {
            let revenue: HashMap<&str, Decimal> = days.iter().map(|d| (d.key.as_str(), d.total_amount)).collect();
            for (date, m) in rows.iter_mut() {
                let staffed = hours.get(date).copied().unwrap_or_default();
                let sold = revenue.get(date.as_str()).copied().unwrap_or_default();
                m.productivity = Some(if staffed > 0.0 { as_f64(sold) / staffed } else { 0.0 });
            }
        }
    }

    if let (true, Some(items)) = (wants("stock_levels"), sources.inventory) {
        let on_hand: i64 = items.iter().map(|i| i64::from(i.current_stock.max(0))).sum();
        for m in rows.values_mut() {
            m.stock_levels = Some(on_hand);
        }
    }

    rows.into_iter().map(|(date, metrics)| CustomRow { date, metrics }).collect()
}

pub fn custom_summary(rows: &[CustomRow], data_sources: &[String]) -> Value {
    let mut summary = serde_json::Map::new();
    if rows.is_empty() {
        return Value::Object(summary);
    }
    let has = |name: &str| data_sources.iter().any(|s| s == name);

    if has("sales") {
        let total: Decimal = rows.iter().filter_map(|r| r.metrics.revenue).sum();
        summary.insert("totalRevenue".into(), json!(total));
    }
    if has("staff") {
        let total: f64 = rows.iter().filter_map(|r| r.metrics.staff_hours).sum();
        summary.insert("totalStaffHours".into(), json!(total));
    }
    if has("inventory") {
        let total: i64 = rows.iter().filter_map(|r| r.metrics.stock_levels).sum();
        summary.insert("averageInventoryLevel".into(), json!(total as f64 / rows.len() as f64));
    }
    Value::Object(summary)
}

// ---
// Service
// ---

struct Draft {
    report_type: &'static str,
    window: Option<(NaiveDate, NaiveDate)>,
    group_by: Option<GroupBy>,
    metrics: Vec<String>,
    data_sources: Vec<String>,
}

impl Draft {
    fn new(report_type: &'static str, window: Option<(NaiveDate, NaiveDate)>) -> Self {
        Self { report_type, window, group_by: None, metrics: Vec::new(), data_sources: Vec::new() }
    }
}

#[derive(Clone)]
pub struct ReportService {
    report_repo: ReportRepository,
    aggregation_repo: AggregationRepository,
    employee_repo: EmployeeRepository,
    roster_repo: RosterRepository,
    inventory_repo: InventoryRepository,
    activity: ActivityService,
}

impl ReportService {
    pub fn new(
        report_repo: ReportRepository,
        aggregation_repo: AggregationRepository,
        employee_repo: EmployeeRepository,
        roster_repo: RosterRepository,
        inventory_repo: InventoryRepository,
        activity: ActivityService,
    ) -> Self {
        Self { report_repo, aggregation_repo, employee_repo, roster_repo, inventory_repo, activity }
    }

    async fn daily_totals(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<BucketTotals>, AppError> {
        self.aggregation_repo
            .range(BucketGranularity::Date, Some(&day_key(start)), Some(&day_key(end)), false)
            .await
    }

    /// Saves the report's metadata with the first rows as a sample and
    /// returns it alongside the full data.
    async fn publish<T: Serialize, S: Serialize>(
        &self,
        actor: &Employee,
        draft: Draft,
        rows: &[T],
        summary: &S,
    ) -> Result<ReportResponse, AppError> {
        let data = serde_json::to_value(rows).context("serializing report rows")?;
        let summary = serde_json::to_value(summary).context("serializing report summary")?;
        let sample: Vec<Value> = rows
            .iter()
            .take(SAMPLE_ROWS)
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()
            .context("serializing report sample")?;

        let now = Utc::now();
        let report = self
            .report_repo
            .save(&NewReport {
                report_type: draft.report_type,
                name: format!("{} Report - {}", draft.report_type, now.format("%Y-%m-%d")),
                created_by: actor.id,
                generated_at: now,
                start_date: draft.window.map(|(s, _)| s),
                end_date: draft.window.map(|(_, e)| e),
                group_by: draft.group_by,
                metrics: draft.metrics,
                data_sources: draft.data_sources,
                summary,
                sample_data: Value::Array(sample),
                data_count: i32::try_from(rows.len()).unwrap_or(i32::MAX),
            })
            .await?;

        self.activity
            .track(
                NewActivity::new(
                    actor.id,
                    ACTIVITY_REPORT_VIEW,
                    "Generated report",
                    format!("Generated {}", report.name),
                )
                .with_metadata(json!({ "reportId": report.id, "reportType": report.report_type })),
            )
            .await;

        tracing::info!("Report {} ({}) generated by {}", report.id, report.report_type, actor.id);
        Ok(ReportResponse { report, data })
    }

    pub async fn sales_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        let (start, end) = required_window(query)?;
        ensure_can_generate(actor)?;

        let group_by = query.group_by.unwrap_or_default();
        let rows = revenue_by_period(&self.daily_totals(start, end).await?, group_by);
        let summary = revenue_summary(&rows);

        let draft = Draft { group_by: Some(group_by), ..Draft::new("revenue", Some((start, end))) };
        self.publish(actor, draft, &rows, &summary).await
    }

    pub async fn staff_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        let (start, end) = required_window(query)?;
        ensure_can_generate(actor)?;

        let ids = query.staff_id_list();
        let staff = if ids.is_empty() {
            self.employee_repo.list(&EmployeeFilter::default()).await?
        } else {
            self.employee_repo.list_by_ids(&ids).await?
        };
        let shifts = self.roster_repo.list_between(start, end).await?;

        let rows = staff_hours(&staff, &shifts);
        let summary = staff_summary(&rows);
        self.publish(actor, Draft::new("hours", Some((start, end))), &rows, &summary)
            .await
    }

    pub async fn inventory_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        ensure_can_generate(actor)?;

        let mut items = self.inventory_repo.list_all().await?;
        if let Some(categories) = query.category_list() {
            let wanted: HashSet<_> = categories.into_iter().collect();
            items.retain(|i| wanted.contains(&i.category));
        }

        let rows = stock_lines(&items);
        let summary = stock_summary(&rows);
        self.publish(actor, Draft::new("stock", None), &rows, &summary).await
    }

    pub async fn financial_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        let (start, end) = required_window(query)?;
        ensure_can_generate(actor)?;

        let days = self
            .aggregation_repo
            .range_with_entries(BucketGranularity::Date, &day_key(start), &day_key(end))
            .await?;
        let items = self.inventory_repo.list_all().await?;

        let rows = financial_periods(&days, &items);
        let summary = financial_summary(&rows);
        self.publish(actor, Draft::new("pnl", Some((start, end))), &rows, &summary)
            .await
    }

    pub async fn operations_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        let (start, end) = required_window(query)?;
        ensure_can_generate(actor)?;

        let shifts = self.roster_repo.list_between(start, end).await?;
        let days = self.daily_totals(start, end).await?;

        let rows = operations_days(&shifts, &days);
        let summary = operations_summary(&rows);
        let draft = Draft { metrics: query.metric_list(), ..Draft::new("efficiency", Some((start, end))) };
        self.publish(actor, draft, &rows, &summary).await
    }

    pub async fn custom_report(&self, actor: &Employee, query: &ReportQuery) -> Result<ReportResponse, AppError> {
        let data_sources = query.source_list();
        let (Some((start, end)), false) = (query.window(), data_sources.is_empty()) else {
            return Err(AppError::bad_request(
                "Start date, end date, and data sources are required",
            ));
        };
        ensure_can_generate(actor)?;

        let has = |name: &str| data_sources.iter().any(|s| s == name);
        let sales = if has("sales") { Some(self.daily_totals(start, end).await?) } else { None };
        let shifts = if has("staff") { Some(self.roster_repo.list_between(start, end).await?) } else { None };
        let inventory = if has("inventory") { Some(self.inventory_repo.list_all().await?) } else { None };

        let metrics = query.metric_list();
        let rows = custom_rows(
            &metrics,
            &CustomSources {
                sales: sales.as_deref(),
                shifts: shifts.as_deref(),
                inventory: inventory.as_deref(),
            },
        );
        let summary = custom_summary(&rows, &data_sources);

        let draft = Draft {
            group_by: Some(query.group_by.unwrap_or_default()),
            metrics,
            data_sources,
            ..Draft::new("custom", Some((start, end)))
        };
        self.publish(actor, draft, &rows, &summary).await
    }

    /// The ten latest reports; managers only see the ones they generated.
    pub async fn recent_reports(&self, actor: &Employee) -> Result<RecentReports, AppError> {
        if !actor.role.is_management() {
            return Err(AppError::forbidden("Only managers and administrators can access reports"));
        }
        let owner = (!actor.role.is_admin()).then_some(actor.id);
        let reports = self.report_repo.recent(owner, RECENT_REPORTS).await?;
        Ok(RecentReports { reports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        aggregation::BucketEntry,
        auth::Role,
        inventory::{fixtures::item, ProductCategory},
        roster::EmployeeSnapshot,
        sales::PaymentMethod,
        staff::fixtures::employee,
    };
    use sqlx::types::Json;

    fn day(key: &str, amount: i64, quantity: i64, count: i64) -> BucketTotals {
        BucketTotals {
            key: key.into(),
            total_amount: Decimal::from(amount),
            total_quantity: quantity,
            transaction_count: count,
        }
    }

    fn shift(who: &Employee, date: NaiveDate, start: &str, end: &str) -> Shift {
        Shift {
            id: Uuid::new_v4(),
            date,
            start_time: start.into(),
            end_time: end.into(),
            employee_id: who.id,
            employee: Json(EmployeeSnapshot::from(who)),
            shift_note: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_periods_start_on_monday() {
        // 2024-03-06 is a Wednesday, 2024-03-10 a Sunday.
        assert_eq!(period_key("2024-03-06", GroupBy::Weekly), "2024-03-04");
        assert_eq!(period_key("2024-03-10", GroupBy::Weekly), "2024-03-04");
        assert_eq!(period_key("2024-03-11", GroupBy::Weekly), "2024-03-11");
        assert_eq!(period_key("2024-03-11", GroupBy::Monthly), "2024-03");
        assert_eq!(period_key("2024-03-11", GroupBy::Daily), "2024-03-11");
    }

    #[test]
    fn revenue_grouping_sums_each_period() {
        let days = [day("2024-03-04", 100, 2, 1), day("2024-03-06", 50, 1, 1), day("2024-04-01", 30, 3, 2)];

        let monthly = revenue_by_period(&days, GroupBy::Monthly);
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].period, "2024-03");
        assert_eq!(monthly[0].total_amount, Decimal::from(150));
        assert_eq!(monthly[0].transaction_count, 2);

        let summary = revenue_summary(&monthly);
        assert_eq!(summary.total_revenue, Decimal::from(180));
        assert_eq!(summary.total_transactions, 4);
        assert_eq!(summary.average_transaction_value, Decimal::from(45));
    }

    #[test]
    fn empty_revenue_has_zero_average() {
        assert_eq!(revenue_summary(&[]).average_transaction_value, Decimal::ZERO);
    }

    #[test]
    fn staff_hours_add_up_per_employee() {
        let ana = employee(Role::Staff);
        let other = employee(Role::Staff);
        let shifts = [
            shift(&ana, d(2024, 3, 4), "09:00", "17:30"),
            shift(&ana, d(2024, 3, 5), "10:00", "14:00"),
            shift(&other, d(2024, 3, 5), "10:00", "14:00"),
        ];

        let lines = staff_hours(std::slice::from_ref(&ana), &shifts);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total_hours, 12.5);
        assert_eq!(lines[0].total_shifts, 2);
        assert_eq!(lines[0].role, "staff");

        let summary = staff_summary(&lines);
        assert_eq!(summary.average_hours_per_staff, 12.5);
    }

    #[test]
    fn stock_status_thresholds() {
        let mut phone = item("Phone", 0, 5);
        assert_eq!(stock_status(&phone), StockStatus::OutOfStock);
        phone.current_stock = 5;
        assert_eq!(stock_status(&phone), StockStatus::LowStock);
        phone.current_stock = 500;
        assert_eq!(stock_status(&phone), StockStatus::Normal);
        phone.max_stock = Some(100);
        assert_eq!(stock_status(&phone), StockStatus::Overstock);
    }

    #[test]
    fn stock_summary_counts_and_values() {
        let lines = stock_lines(&[item("A", 0, 5), item("B", 3, 5), item("C", 20, 5)]);
        let summary = stock_summary(&lines);
        assert_eq!(summary.total_products, 3);
        assert_eq!(summary.total_items, 23);
        assert_eq!(summary.total_value, Decimal::from(2300));
        assert_eq!(summary.low_stock_items, 1);
        assert_eq!(summary.out_of_stock_items, 1);
        assert_eq!(summary.overstock_items, 0);
    }

    #[test]
    fn gross_margin_uses_inventory_cost() {
        let phone = item("Phone", 10, 2);
        let entry = BucketEntry {
            sale_id: Uuid::new_v4(),
            transaction_id: "TRX-1".into(),
            product_id: phone.id.to_string(),
            product_name: "Phone".into(),
            category: ProductCategory::Phones,
            quantity: 2,
            unit_price: Decimal::from(150),
            total_amount: Decimal::from(300),
            store_location: "Main".into(),
            payment_method: PaymentMethod::Cash,
            sale_datetime: Utc::now(),
        };
        let bucket = SalesBucket {
            bucket_key: "2024-03-04".into(),
            total_amount: Decimal::from(300),
            total_quantity: 2,
            transaction_count: 1,
            sales: Json(vec![entry]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let rows = financial_periods(&[bucket], &[phone]);
        assert_eq!(rows[0].cost_of_goods_sold, Decimal::from(200));
        assert_eq!(rows[0].gross_profit, Decimal::from(100));
        assert_eq!(rows[0].gross_margin, Decimal::new(3333, 2));

        let summary = financial_summary(&rows);
        assert_eq!(summary.profit_margin, Decimal::new(3333, 2));
    }

    #[test]
    fn productivity_is_revenue_per_staffed_hour() {
        let ana = employee(Role::Staff);
        let shifts = [shift(&ana, d(2024, 3, 4), "09:00", "13:00")];
        let rows = operations_days(&shifts, &[day("2024-03-04", 400, 4, 2), day("2024-03-05", 90, 1, 1)]);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].shift_count, 1);
        assert_eq!(rows[0].productivity, 100.0);
        assert_eq!(operations_summary(&rows).average_productivity, 100.0);
        assert_eq!(operations_summary(&[]).period_covered, 0);
    }

    #[test]
    fn custom_rows_only_carry_requested_metrics() {
        let ana = employee(Role::Staff);
        let sales = [day("2024-03-04", 200, 2, 1)];
        let shifts = [shift(&ana, d(2024, 3, 4), "09:00", "11:00")];
        let items = [item("A", 7, 1)];
        let metrics = vec!["revenue".to_string(), "productivity".to_string(), "stock_levels".to_string()];

        let rows = custom_rows(
            &metrics,
            &CustomSources { sales: Some(&sales), shifts: Some(&shifts), inventory: Some(&items) },
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metrics.revenue, Some(Decimal::from(200)));
        assert_eq!(rows[0].metrics.productivity, Some(100.0));
        assert_eq!(rows[0].metrics.stock_levels, Some(7));
        assert_eq!(rows[0].metrics.transactions, None);
        assert_eq!(rows[0].metrics.staff_hours, None);

        let sources = vec!["sales".to_string(), "inventory".to_string()];
        let summary = custom_summary(&rows, &sources);
        assert_eq!(summary["averageInventoryLevel"], json!(7.0));
        assert!(summary.get("totalStaffHours").is_none());
    }

    #[test]
    fn staff_cannot_generate_reports() {
        assert!(matches!(ensure_can_generate(&employee(Role::Staff)), Err(AppError::Forbidden(_))));
        assert!(ensure_can_generate(&employee(Role::StoreManager)).is_ok());
    }
}
