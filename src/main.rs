// src/main.rs

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

// Bulk imports send whole days of sales in one body.
const SALES_BODY_LIMIT: usize = 10 * 1024 * 1024;

fn with_import_limit<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(DefaultBodyLimit::max(SALES_BODY_LIMIT))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    common::telemetry::init_tracing(config.log_dir.as_deref())?;

    let app_state = AppState::new(config).await?;

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("database migrations failed")?;
    tracing::info!("✅ Database migrations applied");

    if let (Some(email), Some(password)) = (
        app_state.config.admin_email.as_deref(),
        app_state.config.admin_password.as_deref(),
    ) {
        app_state.auth_service.ensure_bootstrap_admin(email, password).await?;
    }

    let auth_layer = || axum_middleware::from_fn_with_state(app_state.clone(), auth_guard);

    // Public
    let auth_routes = Router::new()
        .route("/login", post(handlers::auth::login))
        .merge(
            Router::new()
                .route("/me", get(handlers::auth::get_me))
                .layer(auth_layer()),
        );

    let staff_routes = Router::new()
        .route(
            "/",
            post(handlers::staff::create_employee).get(handlers::staff::list_employees),
        )
        .route(
            "/{id}",
            get(handlers::staff::get_employee)
                .put(handlers::staff::update_employee)
                .delete(handlers::staff::delete_employee),
        )
        .layer(auth_layer());

    let roster_routes = Router::new()
        .route(
            "/",
            get(handlers::roster::list_shifts).post(handlers::roster::create_shift),
        )
        .route("/by-date", get(handlers::roster::shifts_by_date))
        .route("/upcoming/{staff_id}", get(handlers::roster::upcoming_shifts))
        .route(
            "/{id}",
            put(handlers::roster::update_shift).delete(handlers::roster::delete_shift),
        )
        .layer(auth_layer());

    let inventory_routes = Router::new()
        .route(
            "/",
            post(handlers::inventory::create_item).get(handlers::inventory::get_all_items),
        )
        .route("/value", get(handlers::inventory::inventory_value))
        .route("/low-stock", get(handlers::inventory::low_stock))
        .route(
            "/{id}",
            get(handlers::inventory::get_item)
                .put(handlers::inventory::update_item)
                .delete(handlers::inventory::delete_item),
        )
        .route("/{id}/update-stock", patch(handlers::inventory::update_stock))
        .route("/{id}/history", get(handlers::inventory::stock_history))
        .layer(auth_layer());

    let sales_routes = Router::new()
        .route("/", post(handlers::sales::add_sale).get(handlers::sales::list_sales))
        .route("/bulk-import", post(handlers::sales::bulk_import))
        // Analytics
        .route("/analytics/by-minute", get(handlers::sales::sales_by_minute))
        .route("/analytics/by-hour", get(handlers::sales::sales_by_hour))
        .route("/analytics/by-date", get(handlers::sales::sales_by_date))
        .route("/analytics/date/{date}", get(handlers::sales::sales_for_date))
        .route("/analytics/hour/{hour_key}", get(handlers::sales::sales_for_hour))
        .route("/analytics/hourly/{date}", get(handlers::sales::hourly_sales))
        .route("/analytics/summary", get(handlers::sales::sales_summary))
        .route("/analytics/product-ranking", get(handlers::sales::product_ranking))
        .route("/analytics/dashboard", get(handlers::sales::sales_dashboard))
        // Targets
        .route(
            "/targets",
            get(handlers::sales::get_targets).post(handlers::sales::save_target),
        )
        .route("/targets/range", get(handlers::sales::get_targets_in_range))
        .route(
            "/{id}",
            get(handlers::sales::get_sale)
                .put(handlers::sales::update_sale)
                .delete(handlers::sales::delete_sale),
        );
    let sales_routes = with_import_limit(sales_routes).layer(auth_layer());

    let notification_routes = Router::new()
        .route(
            "/",
            get(handlers::notifications::list_notifications)
                .post(handlers::notifications::create_notification),
        )
        .route("/unread", get(handlers::notifications::unread_notifications))
        .route("/new", get(handlers::notifications::new_notifications))
        .route("/summary", get(handlers::notifications::notification_summary))
        .route("/read-all", put(handlers::notifications::mark_all_read))
        .route(
            "/manual-inventory-check",
            post(handlers::notifications::manual_inventory_check),
        )
        .route(
            "/manual-roster-check",
            post(handlers::notifications::manual_roster_check),
        )
        .route("/{id}/read", put(handlers::notifications::mark_read))
        .route("/{id}", delete(handlers::notifications::delete_notification))
        .layer(auth_layer());

    let request_routes = Router::new()
        .route(
            "/",
            post(handlers::requests::create_request).get(handlers::requests::list_requests),
        )
        .route("/my-requests", get(handlers::requests::my_requests))
        .route("/pending", get(handlers::requests::pending_requests))
        .route(
            "/{id}",
            get(handlers::requests::get_request).delete(handlers::requests::delete_request),
        )
        .route("/{id}/status", put(handlers::requests::update_status))
        .route("/{id}/comments", post(handlers::requests::add_comment))
        .layer(auth_layer());

    let profile_routes = Router::new()
        .route(
            "/{id}",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        .route("/{id}/activity", get(handlers::profile::profile_activity))
        .layer(auth_layer());

    let report_routes = Router::new()
        .route("/recent", get(handlers::reports::recent_reports))
        .route("/sales", get(handlers::reports::sales_report))
        .route("/staff", get(handlers::reports::staff_report))
        .route("/inventory", get(handlers::reports::inventory_report))
        .route("/financial", get(handlers::reports::financial_report))
        .route("/operations", get(handlers::reports::operations_report))
        .route("/custom", get(handlers::reports::custom_report))
        .layer(auth_layer());

    let port = app_state.config.port;

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/employees", staff_routes)
        .nest("/api/rosters", roster_routes)
        .nest("/api/inventory", inventory_routes)
        .nest("/api/sales", sales_routes)
        .nest("/api/notifications", notification_routes)
        .nest("/api/requests", request_routes)
        .nest("/api/profile", profile_routes)
        .nest("/api/reports", report_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .context("could not bind the TCP listener")?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn post_body(router: Router, size: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        let head = format!(
            "POST / HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/octet-stream\r\nContent-Length: {size}\r\nConnection: close\r\n\r\n"
        );
        stream.write_all(head.as_bytes()).await.unwrap();
        stream.write_all(&vec![b'x'; size]).await.unwrap();

        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8_lossy(&response).into_owned()
    }

    fn echo_len() -> Router {
        Router::new().route("/", post(|body: Bytes| async move { body.len().to_string() }))
    }

    #[tokio::test]
    async fn sales_routes_accept_bodies_above_the_default_limit() {
        let size = 3 * 1024 * 1024;
        let response = post_body(with_import_limit(echo_len()), size).await;
        assert!(response.starts_with("HTTP/1.1 200"), "{}", &response[..response.len().min(40)]);
        assert!(response.ends_with(&size.to_string()));
    }
}
