//! JSON HTTP server for the search form.
//!
//! Exposes the submitter and the result store to a browser front end. The
//! front end posts a query, then polls its state until the status leaves
//! `loading`, and renders the returned segments.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/search` | Submit `{"query": "..."}`; replies `202` with the loading snapshot |
//! | `GET`  | `/search?query=...` | Current state of a query, with segments once loaded |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! A missing or malformed JSON body on `POST /search` is also reported as
//! `bad_request` in this shape.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the static site can
//! call the server from another origin.

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::annotate::annotate;
use crate::backend::{SearchBackend, VectaraBackend};
use crate::config::Config;
use crate::error::SearchError;
use crate::models::{SearchResult, SearchStatus, Segment};
use crate::render::to_html;
use crate::store::ResultStore;
use crate::submitter::QuerySubmitter;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    submitter: QuerySubmitter,
}

/// Starts the server against the configured Vectara backend.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backend = VectaraBackend::new(&config.backend, &config.query)?;
    run_server_with_backend(config, Arc::new(backend)).await
}

/// Starts the server with a caller-supplied backend.
pub async fn run_server_with_backend(
    config: &Config,
    backend: Arc<dyn SearchBackend>,
) -> anyhow::Result<()> {
    let store = Arc::new(ResultStore::with_capacity_limit(config.store.max_entries));
    let submitter = QuerySubmitter::new(store, backend);

    let app = router(submitter);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(addr = %listener.local_addr()?, "search server listening");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Builds the route table around an existing submitter.
pub fn router(submitter: QuerySubmitter) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/search", get(handle_observe).post(handle_submit))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(AppState { submitter })
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /search ============

#[derive(Deserialize)]
struct SearchRequest {
    #[serde(default)]
    query: String,
}

/// Snapshot of one query key as returned to the front end.
#[derive(Serialize)]
struct SearchView {
    query: String,
    #[serde(flatten)]
    result: SearchResult,
    /// Annotated summary; present only when loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    segments: Option<Vec<Segment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<String>,
}

impl SearchView {
    fn new(query: String, result: SearchResult) -> Self {
        let segments =
            (result.status == SearchStatus::Loaded).then(|| annotate(&result.summary));
        let html = segments.as_deref().map(to_html);
        Self {
            query,
            result,
            segments,
            html,
        }
    }
}

/// Handler for `POST /search`.
///
/// Returns `400` for a blank query or an unreadable body and `202` with
/// the loading snapshot otherwise. The search itself continues in the
/// background.
async fn handle_submit(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SearchView>), AppError> {
    let Json(req) = payload.map_err(|e| bad_request(e.body_text()))?;

    // Only `EmptyQuery` is reported synchronously.
    state
        .submitter
        .submit(&req.query)
        .map_err(|e: SearchError| bad_request(e.to_string()))?;

    let result = state.submitter.observe(&req.query);
    Ok((StatusCode::ACCEPTED, Json(SearchView::new(req.query, result))))
}

/// Handler for `GET /search?query=...`.
///
/// Unknown queries report `idle`.
async fn handle_observe(
    State(state): State<AppState>,
    Query(req): Query<SearchRequest>,
) -> Json<SearchView> {
    let result = state.submitter.observe(&req.query);
    Json(SearchView::new(req.query, result))
}
