// src/handlers/roster.rs

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
    models::roster::{RosterQuery, Shift, ShiftInput, UpcomingQuery},
};

// GET /api/rosters
#[utoipa::path(
    get,
    path = "/api/rosters",
    tag = "Rosters",
    params(RosterQuery),
    responses((status = 200, description = "Shifts", body = Vec<Shift>)),
    security(("api_jwt" = []))
)]
pub async fn list_shifts(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<RosterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shifts = app_state.roster_service.list_shifts(&query).await?;
    Ok((StatusCode::OK, Json(shifts)))
}

// GET /api/rosters/by-date?date=
#[utoipa::path(
    get,
    path = "/api/rosters/by-date",
    tag = "Rosters",
    params(RosterQuery),
    responses(
        (status = 200, description = "Shifts on the given date", body = Vec<Shift>),
        (status = 400, description = "Date parameter is required")
    ),
    security(("api_jwt" = []))
)]
pub async fn shifts_by_date(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<RosterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shifts = app_state.roster_service.shifts_on(query.date).await?;
    Ok((StatusCode::OK, Json(shifts)))
}

// GET /api/rosters/upcoming/{staff_id}?days=7
#[utoipa::path(
    get,
    path = "/api/rosters/upcoming/{staff_id}",
    tag = "Rosters",
    params(
        ("staff_id" = Uuid, Path, description = "Employee id"),
        UpcomingQuery
    ),
    responses(
        (status = 200, description = "Shifts from today on", body = Vec<Shift>),
        (status = 403, description = "Someone else's roster")
    ),
    security(("api_jwt" = []))
)]
pub async fn upcoming_shifts(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(staff_id): Path<Uuid>,
    Query(query): Query<UpcomingQuery>,
) -> Result<impl IntoResponse, AppError> {
    let shifts = app_state.roster_service.upcoming(&user, staff_id, query.days).await?;
    Ok((StatusCode::OK, Json(shifts)))
}

// POST /api/rosters
#[utoipa::path(
    post,
    path = "/api/rosters",
    tag = "Rosters",
    request_body = ShiftInput,
    responses(
        (status = 201, description = "Shift created", body = Shift),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed to manage rosters"),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shift(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<ShiftInput>,
) -> Result<impl IntoResponse, AppError> {
    let shift = app_state.roster_service.create_shift(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

// PUT /api/rosters/{id}
#[utoipa::path(
    put,
    path = "/api/rosters/{id}",
    tag = "Rosters",
    request_body = ShiftInput,
    params(("id" = Uuid, Path, description = "Shift id")),
    responses(
        (status = 200, description = "Shift updated", body = Shift),
        (status = 404, description = "Shift not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_shift(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ShiftInput>,
) -> Result<impl IntoResponse, AppError> {
    let shift = app_state.roster_service.update_shift(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(shift)))
}

// DELETE /api/rosters/{id}
#[utoipa::path(
    delete,
    path = "/api/rosters/{id}",
    tag = "Rosters",
    params(("id" = Uuid, Path, description = "Shift id")),
    responses(
        (status = 200, description = "Shift deleted", body = MessageResponse),
        (status = 404, description = "Shift not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_shift(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.roster_service.delete_shift(&user, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Shift deleted successfully"))))
}
