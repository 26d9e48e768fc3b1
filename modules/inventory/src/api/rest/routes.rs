//! Route table and OpenAPI document for the inventory REST API.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use stockroom_http::{Problem, ValidationViolation};
use utoipa::OpenApi;

use super::dto::{
    AnalyticsDto, ImportForm, InsightRequest, InsightResponse, ItemDto, ItemInput, SortField,
    SortOrder,
};
use super::handlers;
use crate::domain::insight::InsightService;
use crate::domain::store::InventoryStore;

#[derive(OpenApi)]
#[openapi(
    info(title = "Stockroom inventory API", description = "Inventory items, import/export and statistics"),
    paths(
        handlers::list_items,
        handlers::get_item,
        handlers::create_item,
        handlers::update_item,
        handlers::delete_item,
        handlers::get_analytics,
        handlers::import_items,
        handlers::export_items,
        handlers::ask_insight,
        handlers::health,
    ),
    components(schemas(
        ItemDto,
        ItemInput,
        AnalyticsDto,
        ImportForm,
        InsightRequest,
        InsightResponse,
        SortField,
        SortOrder,
        Problem,
        ValidationViolation,
    )),
    tags(
        (name = "inventory", description = "Inventory items"),
        (name = "system", description = "Service status"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Inventory routes with their shared state attached.
pub fn router(store: Arc<InventoryStore>, insight: Arc<InsightService>) -> Router {
    Router::new()
        .route(
            "/items",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/items/{code}",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route("/analytics", get(handlers::get_analytics))
        .route("/import", post(handlers::import_items))
        .route("/export", get(handlers::export_items))
        .route("/insight", post(handlers::ask_insight))
        .route("/health", get(handlers::health))
        .route("/openapi.json", get(openapi_json))
        .layer(Extension(store))
        .layer(Extension(insight))
}
