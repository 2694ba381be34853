// src/handlers/reports.rs
//
// Every report is computed on demand, saved, and returned together with
// the saved report id.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::report::{RecentReports, ReportQuery, ReportResponse},
};

#[utoipa::path(
    get,
    path = "/api/reports/recent",
    tag = "Reports",
    responses((status = 200, description = "Last ten saved reports", body = RecentReports)),
    security(("api_jwt" = []))
)]
pub async fn recent_reports(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let reports = app_state.report_service.recent_reports(&user).await?;
    Ok((StatusCode::OK, Json(reports)))
}

#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Revenue grouped by period", body = ReportResponse),
        (status = 400, description = "Start date and end date are required"),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.sales_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/staff",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Rostered hours per employee", body = ReportResponse),
        (status = 400, description = "Start date and end date are required"),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn staff_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.staff_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/inventory",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Stock levels and value", body = ReportResponse),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn inventory_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.inventory_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/financial",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Revenue, cost of goods and margin per period", body = ReportResponse),
        (status = 400, description = "Start date and end date are required"),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn financial_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.financial_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/operations",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Revenue per rostered hour by day", body = ReportResponse),
        (status = 400, description = "Start date and end date are required"),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn operations_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.operations_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}

#[utoipa::path(
    get,
    path = "/api/reports/custom",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Selected metrics joined across data sources", body = ReportResponse),
        (status = 400, description = "Start date and end date are required"),
        (status = 403, description = "Only administrators and managers can generate reports")
    ),
    security(("api_jwt" = []))
)]
pub async fn custom_report(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.report_service.custom_report(&user, &query).await?;
    Ok((StatusCode::OK, Json(report)))
}
