//! REST handlers for the inventory module.

use std::sync::Arc;

use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Extension, Multipart, Path, Query};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use stockroom_http::{ApiResult, Problem, ValidationViolation};
use tracing::{debug, instrument};

use super::dto::{
    AnalyticsDto, ImportForm, InsightRequest, InsightResponse, ItemDto, ItemInput, ListItemsQuery,
};
use super::error::{task_failure_problem, validation_problem};
use crate::domain::error::DomainError;
use crate::domain::insight::InsightService;
use crate::domain::model::Item;
use crate::domain::store::InventoryStore;

const EXPORT_FILE_NAME: &str = "inventory.csv";

fn items_to_dto(items: Vec<Item>) -> Vec<ItemDto> {
    items.into_iter().map(Into::into).collect()
}

/// Problem for an extractor rejection, keeping its status (413 for bodies
/// over the limit, 415 for a wrong content type, ...).
fn rejection_problem(status: StatusCode, detail: String) -> Problem {
    let mut problem = validation_problem(detail, Vec::new());
    problem.status = status;
    problem
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| rejection_problem(e.status(), e.body_text()))
}

fn path_code(path: Result<Path<String>, PathRejection>) -> ApiResult<String> {
    path.map(|Path(code)| code)
        .map_err(|e| rejection_problem(e.status(), e.body_text()))
}

fn multipart_problem(e: &MultipartError) -> Problem {
    rejection_problem(e.status(), e.body_text())
}

/// Run a store operation on the blocking pool. Operations wait on the store
/// lock, which mutations hold while writing the backing file.
async fn on_store<T, F>(store: Arc<InventoryStore>, op: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&InventoryStore) -> Result<T, DomainError> + Send + 'static,
{
    let span = tracing::Span::current();
    let result = tokio::task::spawn_blocking(move || span.in_scope(|| op(&store)))
        .await
        .map_err(|e| task_failure_problem(&e))?;
    Ok(result?)
}

/// GET /items
///
/// List items in code order, optionally filtered and re-sorted.
#[utoipa::path(
    get,
    path = "/items",
    tag = "inventory",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Matching items", body = [ItemDto]),
        (status = 400, description = "Invalid query parameters", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn list_items(
    Extension(store): Extension<Arc<InventoryStore>>,
    query: Result<Query<ListItemsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ItemDto>>> {
    let Query(query) = query.map_err(|e| rejection_problem(e.status(), e.body_text()))?;
    let items = query.apply(on_store(store, |store| Ok(store.get_all())).await?);
    debug!(count = items.len(), "Listing items");
    Ok(Json(items_to_dto(items)))
}

/// GET /items/{code}
#[utoipa::path(
    get,
    path = "/items/{code}",
    tag = "inventory",
    params(("code" = String, Path, description = "Item code (case-insensitive)")),
    responses(
        (status = 200, description = "The item", body = ItemDto),
        (status = 404, description = "Unknown code", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn get_item(
    Extension(store): Extension<Arc<InventoryStore>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ItemDto>> {
    let code = path_code(path)?;
    let item = on_store(store, move |store| store.find_by_code(&code)).await?;
    Ok(Json(item.into()))
}

/// POST /items
#[utoipa::path(
    post,
    path = "/items",
    tag = "inventory",
    request_body = ItemInput,
    responses(
        (status = 201, description = "Item created", body = ItemDto),
        (status = 400, description = "Invalid item", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "Duplicate code or inventory full", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Inventory file could not be written", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn create_item(
    Extension(store): Extension<Arc<InventoryStore>>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ItemDto>)> {
    let new_item = json_body(payload)?
        .into_new_item()
        .map_err(|errors| validation_problem("Invalid item", errors))?;
    let item = on_store(store, move |store| store.add(new_item)).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

/// PUT /items/{code}
///
/// Replace description, price and quantity of an existing item.
#[utoipa::path(
    put,
    path = "/items/{code}",
    tag = "inventory",
    params(("code" = String, Path, description = "Item code (case-insensitive)")),
    request_body = ItemInput,
    responses(
        (status = 200, description = "Item updated", body = ItemDto),
        (status = 400, description = "Invalid item", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Unknown code", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Inventory file could not be written", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn update_item(
    Extension(store): Extension<Arc<InventoryStore>>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> ApiResult<Json<ItemDto>> {
    let code = path_code(path)?;
    let update = json_body(payload)?
        .into_update(&code)
        .map_err(|errors| validation_problem("Invalid item", errors))?;
    let item = on_store(store, move |store| store.update(update)).await?;
    Ok(Json(item.into()))
}

/// DELETE /items/{code}
///
/// Returns the removed item.
#[utoipa::path(
    delete,
    path = "/items/{code}",
    tag = "inventory",
    params(("code" = String, Path, description = "Item code (case-insensitive)")),
    responses(
        (status = 200, description = "Item deleted", body = ItemDto),
        (status = 404, description = "Unknown code", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Inventory file could not be written", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn delete_item(
    Extension(store): Extension<Arc<InventoryStore>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<ItemDto>> {
    let code = path_code(path)?;
    let item = on_store(store, move |store| store.delete(&code)).await?;
    Ok(Json(item.into()))
}

/// GET /analytics
#[utoipa::path(
    get,
    path = "/analytics",
    tag = "inventory",
    responses((status = 200, description = "Price statistics", body = AnalyticsDto))
)]
pub async fn get_analytics(
    Extension(store): Extension<Arc<InventoryStore>>,
) -> ApiResult<Json<AnalyticsDto>> {
    let snapshot = on_store(store, |store| Ok(store.statistics())).await?;
    Ok(Json(snapshot.into()))
}

/// POST /import
///
/// Replace the whole inventory with an uploaded file (multipart field `file`).
#[utoipa::path(
    post,
    path = "/import",
    tag = "inventory",
    request_body(content = ImportForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Inventory replaced", body = [ItemDto]),
        (status = 400, description = "Missing or unreadable upload", body = Problem, content_type = "application/problem+json"),
        (status = 409, description = "File holds more items than the capacity", body = Problem, content_type = "application/problem+json"),
        (status = 422, description = "Invalid row; nothing was changed", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn import_items(
    Extension(store): Extension<Arc<InventoryStore>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Vec<ItemDto>>> {
    let mut multipart = multipart.map_err(|e| rejection_problem(e.status(), e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_problem(&e))?
    {
        if field.name() == Some("file") {
            let text = field.text().await.map_err(|e| multipart_problem(&e))?;
            upload = Some(text);
            break;
        }
    }

    let Some(text) = upload else {
        return Err(validation_problem(
            "Missing multipart field 'file'",
            vec![ValidationViolation::new("file", "is required")],
        ));
    };

    let items = on_store(store, move |store| store.import_replace(&text)).await?;
    Ok(Json(items_to_dto(items)))
}

/// GET /export
///
/// Download the inventory in the import/export text format.
#[utoipa::path(
    get,
    path = "/export",
    tag = "inventory",
    responses((status = 200, description = "Inventory file", body = String, content_type = "text/csv"))
)]
pub async fn export_items(
    Extension(store): Extension<Arc<InventoryStore>>,
) -> ApiResult<impl IntoResponse> {
    let text = on_store(store, |store| Ok(store.export_text())).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILE_NAME}\""),
            ),
        ],
        text,
    ))
}

/// POST /insight
///
/// Ask a free-text question answered from the current statistics.
#[utoipa::path(
    post,
    path = "/insight",
    tag = "inventory",
    request_body = InsightRequest,
    responses(
        (status = 200, description = "Assistant reply", body = InsightResponse),
        (status = 400, description = "Empty prompt", body = Problem, content_type = "application/problem+json"),
        (status = 502, description = "Upstream failure", body = Problem, content_type = "application/problem+json"),
        (status = 503, description = "Insight not configured", body = Problem, content_type = "application/problem+json"),
    )
)]
#[instrument(skip_all)]
pub async fn ask_insight(
    Extension(insight): Extension<Arc<InsightService>>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> ApiResult<Json<InsightResponse>> {
    let request = json_body(payload)?;
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(validation_problem(
            "Prompt must not be empty",
            vec![ValidationViolation::new("prompt", "is required")],
        ));
    }
    let reply = insight.ask(prompt).await?;
    Ok(Json(InsightResponse { reply }))
}

/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses((status = 200, description = "Service is up", body = String, content_type = "text/plain"))
)]
pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::io;
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::domain::repo::InventoryFile;
    use crate::domain::store::DEFAULT_CAPACITY;
    use crate::infra::storage::MemoryFile;

    /// Backing file whose first write signals `entered` and then waits for `release`.
    struct GatedFile {
        entered: parking_lot::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
        release: parking_lot::Mutex<mpsc::Receiver<()>>,
    }

    impl InventoryFile for GatedFile {
        fn read(&self) -> io::Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _contents: &str) -> io::Result<()> {
            if let Some(entered) = self.entered.lock().take() {
                entered.send(()).ok();
            }
            self.release
                .lock()
                .recv_timeout(Duration::from_secs(5))
                .map_err(io::Error::other)
        }

        fn describe(&self) -> String {
            "gated".to_owned()
        }
    }

    fn store() -> Arc<InventoryStore> {
        Arc::new(InventoryStore::load(Arc::new(MemoryFile::default()), DEFAULT_CAPACITY).unwrap())
    }

    fn input(code: &str, description: &str, price: f64) -> ItemInput {
        ItemInput {
            code: Some(code.to_owned()),
            description: Some(description.to_owned()),
            price: Some(price),
            quantity: Some(1.0),
        }
    }

    #[tokio::test]
    async fn test_create_then_get_item_handler() {
        let store = store();

        let (status, Json(created)) =
            create_item(Extension(store.clone()), Ok(Json(input(" a1 ", "Anvil", 3.0))))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.code, "A1");

        let Json(found) = get_item(Extension(store), Ok(Path("a1".to_owned())))
            .await
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_create_item_validation_problem() {
        let problem = create_item(
            Extension(store()),
            Ok(Json(ItemInput {
                price: Some(-1.0),
                ..input("A1", "Anvil", 0.0)
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
        assert_eq!(problem.code, "INVENTORY_VALIDATION");
        assert_eq!(problem.errors.unwrap()[0].field, "price");
    }

    #[tokio::test]
    async fn test_update_and_delete_handlers() {
        let store = store();
        store.add(input("A1", "Anvil", 3.0).into_new_item().unwrap()).unwrap();

        let Json(updated) = update_item(
            Extension(store.clone()),
            Ok(Path("a1".to_owned())),
            Ok(Json(ItemInput {
                code: None,
                ..input("A1", "Heavy anvil", 4.0)
            })),
        )
        .await
        .unwrap();
        assert_eq!(updated.description, "Heavy anvil");

        let Json(deleted) = delete_item(Extension(store.clone()), Ok(Path("A1".to_owned())))
            .await
            .unwrap();
        assert_eq!(deleted, updated);

        let problem = delete_item(Extension(store), Ok(Path("A1".to_owned())))
            .await
            .unwrap_err();
        assert_eq!(problem.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insight_rejects_blank_prompt() {
        let insight = Arc::new(InsightService::new(store(), None));
        let problem = ask_insight(
            Extension(insight),
            Ok(Json(InsightRequest {
                prompt: "   ".to_owned(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(problem.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_insight_not_configured() {
        let insight = Arc::new(InsightService::new(store(), None));
        let problem = ask_insight(
            Extension(insight),
            Ok(Json(InsightRequest {
                prompt: "What is low?".to_owned(),
            })),
        )
        .await
        .unwrap_err();
        assert_eq!(problem.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_pending_write_does_not_block_the_runtime() {
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let file = Arc::new(GatedFile {
            entered: parking_lot::Mutex::new(Some(entered_tx)),
            release: parking_lot::Mutex::new(release_rx),
        });
        let store = Arc::new(InventoryStore::load(file, DEFAULT_CAPACITY).unwrap());

        let pending = tokio::spawn(create_item(
            Extension(store.clone()),
            Ok(Json(input("A1", "Anvil", 3.0))),
        ));
        entered_rx.await.unwrap();

        // The single runtime thread is free while the write is held open.
        assert_eq!(health().await, "ok");
        assert!(!pending.is_finished());

        release_tx.send(()).unwrap();
        let (status, Json(created)) = pending.await.unwrap().unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(store.find_by_code("A1").unwrap().code, created.code);
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, "ok");
    }
}
