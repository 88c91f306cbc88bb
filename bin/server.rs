// Stock Count - Web Server
// Three form views plus a small JSON API, one interaction per request

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Form, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use stock_count::pages::{self, AddItemForm, Banner, DeleteItemForm, UpdateQuantityForm};
use stock_count::{export, logging, AppConfig, MovementRecord, StockError, Store};

/// Shared application state
#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    /// Serializes interactions so each load -> commit runs alone.
    interaction: Arc<Mutex<()>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message.into()),
        }
    }
}

/// Fatal failure of one interaction.
struct ServerError(StockError);

impl From<StockError> for ServerError {
    fn from(err: StockError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "interaction failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Something went wrong</h1><p>{}</p><a href=\"/\">Back</a>",
                pages::escape(&self.0.to_string())
            )),
        )
            .into_response()
    }
}

type PageResult = Result<Response, ServerError>;

/// Validation failures re-display the page; anything else is fatal.
fn split_outcome(result: Result<String, StockError>) -> Result<(StatusCode, Banner), ServerError> {
    match result {
        Ok(msg) => Ok((StatusCode::OK, Banner::success(msg))),
        Err(StockError::Validation(err)) => {
            tracing::info!(reason = %err, "request rejected");
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Banner::error(err.to_string())))
        }
        Err(err) => Err(err.into()),
    }
}

// ============================================================================
// Page Handlers
// ============================================================================

fn render_current_stock(store: &Store, banner: Option<&Banner>) -> Result<String, StockError> {
    let inventory = store.load()?;
    Ok(pages::current_stock_page(
        &inventory.stock_levels(),
        inventory.stock(),
        &inventory.order_list(),
        banner,
    ))
}

/// GET / - Current stock and order list
async fn current_stock(State(state): State<AppState>) -> PageResult {
    let _guard = state.interaction.lock().await;
    let html = render_current_stock(&state.store, None)?;
    Ok(Html(html).into_response())
}

/// POST /items - Add a new item to both stores
async fn add_item(State(state): State<AppState>, Form(form): Form<AddItemForm>) -> PageResult {
    let _guard = state.interaction.lock().await;

    let result = form
        .parse()
        .map_err(StockError::from)
        .and_then(|new_item| {
            let name = new_item.name.trim().to_string();
            state.store.add_item(new_item).map(|_| {
                format!("Successfully added {name} to the stock and updated its threshold!")
            })
        });
    let (status, banner) = split_outcome(result)?;

    let html = render_current_stock(&state.store, Some(&banner))?;
    Ok((status, Html(html)).into_response())
}

/// POST /items/delete - Remove an item from both stores
async fn delete_item(
    State(state): State<AppState>,
    Form(form): Form<DeleteItemForm>,
) -> PageResult {
    let _guard = state.interaction.lock().await;

    let result = state.store.delete_item(&form.item).map(|outcome| {
        if outcome.changed() {
            format!("Successfully deleted {} from the stock.", form.item)
        } else {
            format!("{} is not in the stock", form.item)
        }
    });
    let (status, banner) = split_outcome(result)?;

    let html = render_current_stock(&state.store, Some(&banner))?;
    Ok((status, Html(html)).into_response())
}

/// GET /update - Single item quantity form
async fn update_page(State(state): State<AppState>) -> PageResult {
    let _guard = state.interaction.lock().await;
    let inventory = state.store.load()?;
    Ok(Html(pages::update_quantity_page(inventory.stock(), None)).into_response())
}

/// POST /update - Overwrite one item's quantity
async fn update_quantity(
    State(state): State<AppState>,
    Form(form): Form<UpdateQuantityForm>,
) -> PageResult {
    let _guard = state.interaction.lock().await;

    let result = form
        .quantity()
        .map_err(StockError::from)
        .and_then(|quantity| {
            state.store.update_quantity(&form.item, quantity).map(|updated| {
                if updated {
                    format!("Successfully updated the quantity of {} to {}!", form.item, quantity)
                } else {
                    format!("{} is no longer in the stock", form.item)
                }
            })
        });
    let (status, banner) = split_outcome(result)?;

    let inventory = state.store.load()?;
    let html = pages::update_quantity_page(inventory.stock(), Some(&banner));
    Ok((status, Html(html)).into_response())
}

/// GET /movement - Bulk movement entry form
async fn movement_page(State(state): State<AppState>) -> PageResult {
    let _guard = state.interaction.lock().await;
    let inventory = state.store.load()?;
    Ok(Html(pages::movement_page(inventory.stock(), None, None)).into_response())
}

/// POST /movement - Record moved quantities and append history
async fn record_movement(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> PageResult {
    let _guard = state.interaction.lock().await;

    let mut recorded: Vec<MovementRecord> = Vec::new();
    let result = pages::parse_movement_form(&fields)
        .map_err(StockError::from)
        .and_then(|moves| state.store.record_movements(&moves))
        .map(|records| {
            recorded = records;
            "Stock movement recorded and updated successfully!".to_string()
        });
    let (status, banner) = split_outcome(result)?;

    let inventory = state.store.load()?;
    let summary = (!recorded.is_empty()).then_some(recorded.as_slice());
    let html = pages::movement_page(inventory.stock(), summary, Some(&banner));
    Ok((status, Html(html)).into_response())
}

/// GET /orders.pdf - Download the order list
async fn orders_pdf(State(state): State<AppState>) -> PageResult {
    let _guard = state.interaction.lock().await;
    let inventory = state.store.load()?;
    let bytes = export::render_order_list(&inventory.order_list())?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::FILE_NAME),
            ),
        ],
        bytes,
    )
        .into_response())
}

// ============================================================================
// API Handlers
// ============================================================================

fn api_failure(err: StockError) -> Response {
    tracing::error!(error = %err, "api request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::<()>::err(err.to_string())),
    )
        .into_response()
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/stock - All stock rows
async fn get_stock(State(state): State<AppState>) -> Response {
    let _guard = state.interaction.lock().await;
    match state.store.load() {
        Ok(inventory) => Json(ApiResponse::ok(inventory.stock_levels())).into_response(),
        Err(e) => api_failure(e),
    }
}

/// GET /api/stock/:name - One stock row
async fn get_stock_item(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    let _guard = state.interaction.lock().await;

    // Path has already percent-decoded the segment
    match state.store.load() {
        Ok(inventory) => match inventory.item(&name) {
            Some(item) => Json(ApiResponse::ok(item.clone())).into_response(),
            None => (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::<()>::err(format!("{name} is not in the stock"))),
            )
                .into_response(),
        },
        Err(e) => api_failure(e),
    }
}

/// GET /api/thresholds - All threshold rows
async fn get_thresholds(State(state): State<AppState>) -> Response {
    let _guard = state.interaction.lock().await;
    match state.store.load() {
        Ok(inventory) => {
            Json(ApiResponse::ok(inventory.thresholds().to_vec())).into_response()
        }
        Err(e) => api_failure(e),
    }
}

/// GET /api/orders - Current order list
async fn get_orders(State(state): State<AppState>) -> Response {
    let _guard = state.interaction.lock().await;
    match state.store.load() {
        Ok(inventory) => Json(ApiResponse::ok(inventory.order_list())).into_response(),
        Err(e) => api_failure(e),
    }
}

/// GET /api/history - Movement history log
async fn get_history(State(state): State<AppState>) -> Response {
    let _guard = state.interaction.lock().await;
    match state.store.history() {
        Ok(history) => Json(ApiResponse::ok(history)).into_response(),
        Err(e) => api_failure(e),
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    // Build API routes
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/stock", get(get_stock))
        .route("/stock/:name", get(get_stock_item))
        .route("/thresholds", get(get_thresholds))
        .route("/orders", get(get_orders))
        .route("/history", get(get_history))
        .with_state(state.clone());

    // Build main router
    Router::new()
        .route("/", get(current_stock))
        .route("/items", axum::routing::post(add_item))
        .route("/items/delete", axum::routing::post(delete_item))
        .route("/update", get(update_page).post(update_quantity))
        .route("/movement", get(movement_page).post(record_movement))
        .route("/orders.pdf", get(orders_pdf))
        .with_state(state)
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_json();

    let config = AppConfig::from_env();
    tracing::info!(
        stock = %config.files.stock.display(),
        thresholds = %config.files.thresholds.display(),
        history = %config.files.history.display(),
        "using data files"
    );

    // Fail fast on unreadable data instead of on the first request
    let store = Store::new(config.files.clone());
    let inventory = store.load()?;
    tracing::info!(items = inventory.stock().len(), "inventory readable");

    let state = AppState {
        store: Arc::new(store),
        interaction: Arc::new(Mutex::new(())),
    };
    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "stock count server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
