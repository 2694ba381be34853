// src/handlers/profile.rs

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
    middleware::auth::AuthenticatedUser,
    models::{
        activity::{ActivityPage, ActivityQuery, ProfileUpdatePayload, ProfileUpdated},
        staff::Employee,
    },
};

#[utoipa::path(
    get,
    path = "/api/profile/{id}",
    tag = "Profile",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Profile", body = Employee),
        (status = 403, description = "Not the caller's own profile"),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.profile_service.get_profile(&user, id).await?;
    Ok((StatusCode::OK, Json(employee)))
}

#[utoipa::path(
    put,
    path = "/api/profile/{id}",
    tag = "Profile",
    request_body = ProfileUpdatePayload,
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdated),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not the caller's own profile"),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_profile(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<ProfileUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.profile_service.update_profile(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(updated)))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}/activity",
    tag = "Profile",
    params(("id" = Uuid, Path, description = "Employee id"), ActivityQuery),
    responses(
        (status = 200, description = "Activity log, newest first", body = ActivityPage),
        (status = 403, description = "Not the caller's own activity")
    ),
    security(("api_jwt" = []))
)]
pub async fn profile_activity(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Query(query): Query<ActivityQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = app_state.profile_service.activities(&user, id, &query).await?;
    Ok((StatusCode::OK, Json(page)))
}
