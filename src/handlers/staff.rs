// src/handlers/staff.rs

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
    models::staff::{Employee, EmployeeFilter, EmployeeInput},
};

// POST /api/employees
#[utoipa::path(
    post,
    path = "/api/employees",
    tag = "Staff",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed to manage staff"),
        (status = 409, description = "Email or employee id already in use")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_employee(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<EmployeeInput>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.staff_service.create_employee(&user, payload).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

// GET /api/employees
#[utoipa::path(
    get,
    path = "/api/employees",
    tag = "Staff",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Employees matching the filter", body = Vec<Employee>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<EmployeeFilter>,
) -> Result<impl IntoResponse, AppError> {
    let employees = app_state.staff_service.list_employees(&filter).await?;
    Ok((StatusCode::OK, Json(employees)))
}

// GET /api/employees/{id}
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_employee(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.staff_service.get_employee(id).await?;
    Ok((StatusCode::OK, Json(employee)))
}

// PUT /api/employees/{id}
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    tag = "Staff",
    request_body = EmployeeInput,
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Not allowed to change this employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_employee(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<EmployeeInput>,
) -> Result<impl IntoResponse, AppError> {
    let employee = app_state.staff_service.update_employee(&user, id, payload).await?;
    Ok((StatusCode::OK, Json(employee)))
}

// DELETE /api/employees/{id}
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    tag = "Staff",
    params(("id" = Uuid, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deleted", body = MessageResponse),
        (status = 403, description = "Not allowed to delete this employee"),
        (status = 404, description = "Employee not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_employee(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.staff_service.delete_employee(&user, id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Employee deleted successfully"))))
}
