// src/handlers/inventory.rs

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
    models::inventory::{
        InventoryFilter, InventoryHistoryEntry, InventoryInput, InventoryItem, InventoryValue,
        UpdateStockPayload,
    },
};

// ---
// Handler: inventory_value
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/value",
    tag = "Inventory",
    responses((status = 200, description = "Stock value per category and in total", body = InventoryValue)),
    security(("api_jwt" = []))
)]
pub async fn inventory_value(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let value = app_state.inventory_service.value().await?;
    Ok((StatusCode::OK, Json(value)))
}

// ---
// Handler: low_stock
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    tag = "Inventory",
    responses((status = 200, description = "Items at or below their reorder point", body = Vec<InventoryItem>)),
    security(("api_jwt" = []))
)]
pub async fn low_stock(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.low_stock().await?;
    Ok((StatusCode::OK, Json(items)))
}

// ---
// Handler: create_item
// ---
#[utoipa::path(
    post,
    path = "/api/inventory",
    tag = "Inventory",
    request_body = InventoryInput,
    responses(
        (status = 201, description = "Item created", body = InventoryItem),
        (status = 400, description = "Validation failed")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(payload): JsonBody<InventoryInput>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.create_item(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

// ---
// Handler: get_all_items
// ---
#[utoipa::path(
    get,
    path = "/api/inventory",
    tag = "Inventory",
    params(InventoryFilter),
    responses((status = 200, description = "Inventory items", body = Vec<InventoryItem>)),
    security(("api_jwt" = []))
)]
pub async fn get_all_items(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Query(filter): Query<InventoryFilter>,
) -> Result<impl IntoResponse, AppError> {
    let items = app_state.inventory_service.list_items(&filter).await?;
    Ok((StatusCode::OK, Json(items)))
}

// ---
// Handler: get_item
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Inventory item", body = InventoryItem),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_item(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.get_item(id).await?;
    Ok((StatusCode::OK, Json(item)))
}

// ---
// Handler: update_item
// ---
#[utoipa::path(
    put,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    request_body = InventoryInput,
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item updated", body = InventoryItem),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_item(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<InventoryInput>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.update_item(id, payload, user.id).await?;
    Ok((StatusCode::OK, Json(item)))
}

// ---
// Handler: update_stock
// ---
#[utoipa::path(
    patch,
    path = "/api/inventory/{id}/update-stock",
    tag = "Inventory",
    request_body = UpdateStockPayload,
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Stock adjusted and recorded in the history", body = InventoryItem),
        (status = 400, description = "Stock cannot be negative"),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_stock(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<UpdateStockPayload>,
) -> Result<impl IntoResponse, AppError> {
    let item = app_state.inventory_service.update_stock(id, payload, user.id).await?;
    Ok((StatusCode::OK, Json(item)))
}

// ---
// Handler: stock_history
// ---
#[utoipa::path(
    get,
    path = "/api/inventory/{id}/history",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Stock movements, newest first", body = Vec<InventoryHistoryEntry>),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn stock_history(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let history = app_state.inventory_service.history(id).await?;
    Ok((StatusCode::OK, Json(history)))
}

// ---
// Handler: delete_item
// ---
#[utoipa::path(
    delete,
    path = "/api/inventory/{id}",
    tag = "Inventory",
    params(("id" = Uuid, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 404, description = "Inventory item not found")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_item(
    State(app_state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.inventory_service.delete_item(id).await?;
    Ok((StatusCode::OK, Json(MessageResponse::new("Inventory item deleted successfully"))))
}
