// src/handlers/notifications.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{error::AppError, extract::JsonBody},
    config::AppState,
    handlers::MessageResponse,
    middleware::auth::AuthenticatedUser,
    models::notification::{
        MarkedRead, Notification, NotificationInput, NotificationList, NotificationQuery,
        NotificationSummary, NotificationView,
    },
    services::jobs::{JobOutcome, INVENTORY_CHECK, ROSTER_CHECK},
};

// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    params(NotificationQuery),
    responses((status = 200, description = "Notifications addressed to the caller", body = NotificationList)),
    security(("api_jwt" = []))
)]
pub async fn list_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<NotificationQuery>,
) -> Result<impl IntoResponse, AppError> {
    let list = app_state.notification_service.list(&user, query.limit).await?;
    Ok((StatusCode::OK, Json(list)))
}

// GET /api/notifications/unread
#[utoipa::path(
    get,
    path = "/api/notifications/unread",
    tag = "Notifications",
    responses((status = 200, description = "Unread notifications", body = NotificationList)),
    security(("api_jwt" = []))
)]
pub async fn unread_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let list = app_state.notification_service.unread(&user).await?;
    Ok((StatusCode::OK, Json(list)))
}

// GET /api/notifications/new
#[utoipa::path(
    get,
    path = "/api/notifications/new",
    tag = "Notifications",
    responses((status = 200, description = "Created since the caller last checked; moves the checkpoint", body = NotificationList)),
    security(("api_jwt" = []))
)]
pub async fn new_notifications(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let list = app_state.notification_service.new_since_last_check(&user).await?;
    Ok((StatusCode::OK, Json(list)))
}

// GET /api/notifications/summary
#[utoipa::path(
    get,
    path = "/api/notifications/summary",
    tag = "Notifications",
    responses((status = 200, description = "Unread and new notifications in one call", body = NotificationSummary)),
    security(("api_jwt" = []))
)]
pub async fn notification_summary(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let summary = app_state.notification_service.summary(&user).await?;
    Ok((StatusCode::OK, Json(summary)))
}

// POST /api/notifications
#[utoipa::path(
    post,
    path = "/api/notifications",
    tag = "Notifications",
    request_body = NotificationInput,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Only administrators and managers can create notifications")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_notification(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<NotificationInput>,
) -> Result<impl IntoResponse, AppError> {
    let notification = app_state.notification_service.create(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

// PUT /api/notifications/read-all
#[utoipa::path(
    put,
    path = "/api/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "Everything visible to the caller marked as read", body = MarkedRead)),
    security(("api_jwt" = []))
)]
pub async fn mark_all_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let marked = app_state.notification_service.mark_all_read(&user).await?;
    Ok((StatusCode::OK, Json(marked)))
}

// PUT /api/notifications/{id}/read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Marked as read", body = NotificationView),
        (status = 404, description = "Notification not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn mark_read(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let view = app_state.notification_service.mark_read(&user, id).await?;
    Ok((StatusCode::OK, Json(view)))
}

// DELETE /api/notifications/{id}
#[utoipa::path(
    delete,
    path = "/api/notifications/{id}",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification deleted", body = MessageResponse),
        (status = 403, description = "Neither an admin nor the creator"),
        (status = 404, description = "Notification not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_notification(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.notification_service.delete(&user, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Notification deleted successfully"))))
}

// ---
// Manual checks
// ---

async fn run_job(app_state: &AppState, name: &str) -> Result<(StatusCode, Json<JobOutcome>), AppError> {
    let outcome = app_state.jobs.run(name).await?;
    let status = if outcome.success { StatusCode::OK } else { StatusCode::INTERNAL_SERVER_ERROR };
    Ok((status, Json(outcome)))
}

// POST /api/notifications/manual-inventory-check
#[utoipa::path(
    post,
    path = "/api/notifications/manual-inventory-check",
    tag = "Notifications",
    responses(
        (status = 200, description = "Check ran", body = JobOutcome),
        (status = 500, description = "Check failed or is not enabled")
    ),
    security(("api_jwt" = []))
)]
pub async fn manual_inventory_check(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    run_job(&app_state, INVENTORY_CHECK).await
}

// POST /api/notifications/manual-roster-check
#[utoipa::path(
    post,
    path = "/api/notifications/manual-roster-check",
    tag = "Notifications",
    responses(
        (status = 200, description = "Check ran", body = JobOutcome),
        (status = 500, description = "Check failed or is not enabled")
    ),
    security(("api_jwt" = []))
)]
pub async fn manual_roster_check(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    run_job(&app_state, ROSTER_CHECK).await
}
