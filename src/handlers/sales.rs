// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    handlers::MessageResponse,
    middleware::auth::AuthenticatedUser,
    models::{
        aggregation::{BucketGranularity, BucketTotals},
        sales::{
            BucketDetail, BulkImportPayload, BulkImportResult, DateRangeQuery, HourlySales,
            KeyRangeQuery, ProductRanking, Sale, SaleInput, SalesDashboard, SalesListQuery,
            SalesListResponse, SalesSummary,
        },
        target::{SalesTargetPayload, TargetOverview, TargetQuery, TargetRangeQuery, TargetSaved},
    },
};

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = SaleInput,
    responses(
        (status = 201, description = "Sale recorded, stock deducted and buckets updated", body = Sale),
        (status = 400, description = "Validation failed or insufficient stock"),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_sale(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<SaleInput>,
) -> Result<impl IntoResponse, AppError> {
    let sale = app_state.sales_service.add_sale(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(SalesListQuery),
    responses((status = 200, description = "A page of sales with totals", body = SalesListResponse)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<SalesListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.sales_service.list_sales(&query).await?;
    Ok((StatusCode::OK, Json(page)))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale", body = Sale),
        (status = 404, description = "Sale not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let sale = app_state.sales_service.get_sale(id).await?;
    Ok((StatusCode::OK, Json(sale)))
}

// PUT /api/sales/{id}
#[utoipa::path(
    put,
    path = "/api/sales/{id}",
    tag = "Sales",
    request_body = SaleInput,
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale updated and buckets rebalanced", body = Sale),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Sale not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_sale(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SaleInput>,
) -> Result<impl IntoResponse, AppError> {
    let sale = app_state.sales_service.update_sale(id, payload).await?;
    Ok((StatusCode::OK, Json(sale)))
}

// DELETE /api/sales/{id}
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "Sale id")),
    responses(
        (status = 200, description = "Sale deleted and removed from its buckets", body = MessageResponse),
        (status = 404, description = "Sale not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_sale(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.sales_service.delete_sale(id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Sale deleted successfully"))))
}

// POST /api/sales/bulk-import
#[utoipa::path(
    post,
    path = "/api/sales/bulk-import",
    tag = "Sales",
    request_body = BulkImportPayload,
    responses((status = 201, description = "Valid rows imported, invalid rows reported", body = BulkImportResult)),
    security(("api_jwt" = []))
)]
pub async fn bulk_import(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    JsonBody(payload): JsonBody<BulkImportPayload>,
) -> Result<impl IntoResponse, AppError> {
    let result = app_state.sales_service.bulk_import(payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

// ---
// Analytics
// ---

async fn bucket_range(
    app_state: &AppState,
    granularity: BucketGranularity,
    query: &KeyRangeQuery,
) -> Result<(StatusCode, Json<Vec<BucketTotals>>), AppError> {
    let buckets = app_state.sales_service.buckets(granularity, query).await?;
    Ok((StatusCode::OK, Json(buckets)))
}

#[utoipa::path(
    get,
    path = "/api/sales/analytics/by-minute",
    tag = "Sales Analytics",
    params(KeyRangeQuery),
    responses((status = 200, description = "Minute buckets, newest first", body = Vec<BucketTotals>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_minute(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<KeyRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    bucket_range(&app_state, BucketGranularity::Minute, &query).await
}

#[utoipa::path(
    get,
    path = "/api/sales/analytics/by-hour",
    tag = "Sales Analytics",
    params(KeyRangeQuery),
    responses((status = 200, description = "Hour buckets, newest first", body = Vec<BucketTotals>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_hour(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<KeyRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    bucket_range(&app_state, BucketGranularity::Hour, &query).await
}

#[utoipa::path(
    get,
    path = "/api/sales/analytics/by-date",
    tag = "Sales Analytics",
    params(KeyRangeQuery),
    responses((status = 200, description = "Date buckets, newest first", body = Vec<BucketTotals>)),
    security(("api_jwt" = []))
)]
pub async fn sales_by_date(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<KeyRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    bucket_range(&app_state, BucketGranularity::Date, &query).await
}

// GET /api/sales/analytics/date/{date}
#[utoipa::path(
    get,
    path = "/api/sales/analytics/date/{date}",
    tag = "Sales Analytics",
    params(("date" = String, Path, description = "Date key, YYYY-MM-DD")),
    responses((status = 200, description = "The day's totals and sales; zeros when nothing sold", body = BucketDetail)),
    security(("api_jwt" = []))
)]
pub async fn sales_for_date(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.sales_service.bucket_detail(BucketGranularity::Date, &date).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// GET /api/sales/analytics/hour/{hour_key}
#[utoipa::path(
    get,
    path = "/api/sales/analytics/hour/{hour_key}",
    tag = "Sales Analytics",
    params(("hour_key" = String, Path, description = "Hour key, YYYY-MM-DD-HH")),
    responses((status = 200, description = "The hour's totals and sales; zeros when nothing sold", body = BucketDetail)),
    security(("api_jwt" = []))
)]
pub async fn sales_for_hour(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(hour_key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.sales_service.bucket_detail(BucketGranularity::Hour, &hour_key).await?;
    Ok((StatusCode::OK, Json(detail)))
}

// GET /api/sales/analytics/hourly/{date}
#[utoipa::path(
    get,
    path = "/api/sales/analytics/hourly/{date}",
    tag = "Sales Analytics",
    params(("date" = String, Path, description = "Date, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Business hours 10..21 with zeros filled in", body = Vec<HourlySales>),
        (status = 400, description = "Invalid date")
    ),
    security(("api_jwt" = []))
)]
pub async fn hourly_sales(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(date): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD"))?;
    let hours = app_state.sales_service.hourly(date).await?;
    Ok((StatusCode::OK, Json(hours)))
}

// GET /api/sales/analytics/summary
#[utoipa::path(
    get,
    path = "/api/sales/analytics/summary",
    tag = "Sales Analytics",
    params(DateRangeQuery),
    responses((status = 200, description = "Totals by category, payment method and store", body = SalesSummary)),
    security(("api_jwt" = []))
)]
pub async fn sales_summary(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.sales_service.summary(&query).await?;
    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/sales/analytics/product-ranking
#[utoipa::path(
    get,
    path = "/api/sales/analytics/product-ranking",
    tag = "Sales Analytics",
    params(DateRangeQuery),
    responses((status = 200, description = "Best selling products by revenue", body = Vec<ProductRanking>)),
    security(("api_jwt" = []))
)]
pub async fn product_ranking(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let ranking = app_state.sales_service.product_ranking(&query).await?;
    Ok((StatusCode::OK, Json(ranking)))
}

// GET /api/sales/analytics/dashboard
#[utoipa::path(
    get,
    path = "/api/sales/analytics/dashboard",
    tag = "Sales Analytics",
    responses((status = 200, description = "Today against yesterday plus the last 30 days", body = SalesDashboard)),
    security(("api_jwt" = []))
)]
pub async fn sales_dashboard(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let dashboard = app_state.sales_service.dashboard().await?;
    Ok((StatusCode::OK, Json(dashboard)))
}

// ---
// Targets
// ---

// GET /api/sales/targets?year&month&day
#[utoipa::path(
    get,
    path = "/api/sales/targets",
    tag = "Sales Targets",
    params(TargetQuery),
    responses(
        (status = 200, description = "Targets active in the month or day, with progress", body = TargetOverview),
        (status = 400, description = "Missing or invalid year, month or day")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_targets(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<TargetQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.window()?;
    let overview = app_state.sales_service.targets_overlapping(start, end).await?;
    Ok((StatusCode::OK, Json(overview)))
}

// GET /api/sales/targets/range?startDate&endDate
#[utoipa::path(
    get,
    path = "/api/sales/targets/range",
    tag = "Sales Targets",
    params(TargetRangeQuery),
    responses(
        (status = 200, description = "Targets overlapping the range, with progress", body = TargetOverview),
        (status = 400, description = "Missing or inverted range")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_targets_in_range(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<TargetRangeQuery>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = query.window()?;
    let overview = app_state.sales_service.targets_overlapping(start, end).await?;
    Ok((StatusCode::OK, Json(overview)))
}

// POST /api/sales/targets
#[utoipa::path(
    post,
    path = "/api/sales/targets",
    tag = "Sales Targets",
    request_body = SalesTargetPayload,
    responses(
        (status = 200, description = "Target created or replaced", body = TargetSaved),
        (status = 400, description = "Validation failed")
    ),
    security(("api_jwt" = []))
)]
pub async fn save_target(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<SalesTargetPayload>,
) -> Result<impl IntoResponse, AppError> {
    let saved = app_state.sales_service.save_target(&payload, user.id).await?;
    Ok((StatusCode::OK, Json(saved)))
}
