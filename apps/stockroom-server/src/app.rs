//! HTTP application assembly: module routes plus transport layers.

use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use inventory::InventoryModule;
use stockroom_bootstrap::AppConfig;
use stockroom_http::build_cors_layer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Wrap the inventory routes with CORS, body limits, timeout and tracing.
///
/// # Errors
/// Returns an error if the CORS policy is invalid.
pub fn build_router(config: &AppConfig, inventory: &InventoryModule) -> Result<Router> {
    let cors = build_cors_layer(&config.cors).context("invalid CORS configuration")?;
    let body_limit = config.server.max_upload_bytes;

    Ok(inventory
        .router()
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.server.request_timeout_secs),
        ))
        .layer(TraceLayer::new_for_http()))
}
