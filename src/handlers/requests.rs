// src/handlers/requests.rs

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
    models::request::{CommentPayload, RequestInput, RequestQuery, StaffRequest, UpdateStatusPayload},
};

#[utoipa::path(
    post,
    path = "/api/requests",
    tag = "Requests",
    request_body = RequestInput,
    responses(
        (status = 201, description = "Request submitted", body = StaffRequest),
        (status = 400, description = "Missing or inconsistent fields for the request type")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<RequestInput>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.request_service.create_request(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

#[utoipa::path(
    get,
    path = "/api/requests",
    tag = "Requests",
    params(RequestQuery),
    responses((status = 200, description = "Requests the caller may see", body = Vec<StaffRequest>)),
    security(("api_jwt" = []))
)]
pub async fn list_requests(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state.request_service.list_requests(&user, &query).await?;
    Ok((StatusCode::OK, Json(requests)))
}

#[utoipa::path(
    get,
    path = "/api/requests/my-requests",
    tag = "Requests",
    params(RequestQuery),
    responses((status = 200, description = "Requests submitted by the caller", body = Vec<StaffRequest>)),
    security(("api_jwt" = []))
)]
pub async fn my_requests(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<RequestQuery>,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state.request_service.my_requests(&user, &query).await?;
    Ok((StatusCode::OK, Json(requests)))
}

#[utoipa::path(
    get,
    path = "/api/requests/pending",
    tag = "Requests",
    responses(
        (status = 200, description = "Pending requests awaiting review", body = Vec<StaffRequest>),
        (status = 403, description = "Only administrators and managers can view pending requests")
    ),
    security(("api_jwt" = []))
)]
pub async fn pending_requests(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let requests = app_state.request_service.pending_requests(&user).await?;
    Ok((StatusCode::OK, Json(requests)))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request", body = StaffRequest),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Request not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.request_service.get_request(&user, id).await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    put,
    path = "/api/requests/{id}/status",
    tag = "Requests",
    request_body = UpdateStatusPayload,
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Decision recorded", body = StaffRequest),
        (status = 400, description = "Request already processed or invalid status"),
        (status = 403, description = "Only administrators can approve or reject requests"),
        (status = 404, description = "Request not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateStatusPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.request_service.update_status(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/comments",
    tag = "Requests",
    request_body = CommentPayload,
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Comment appended", body = StaffRequest),
        (status = 403, description = "Not visible to the caller"),
        (status = 404, description = "Request not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_comment(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<CommentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let request = app_state.request_service.add_comment(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(request)))
}

#[utoipa::path(
    delete,
    path = "/api/requests/{id}",
    tag = "Requests",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request deleted", body = MessageResponse),
        (status = 400, description = "Only pending requests can be deleted"),
        (status = 403, description = "Neither an admin nor the requester"),
        (status = 404, description = "Request not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_request(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.request_service.delete_request(&user, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Request deleted successfully"))))
}
