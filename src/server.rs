//! HTTP question-answering endpoint.
//!
//! The index, embedder, completer and prompt template are assembled once
//! at startup into an [`Orchestrator`] shared by every request. An index
//! built with a different embedding model than the configured one is
//! rejected before the listener is bound.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `{base_path}/api/query` | Answer `{"query": "..."}` with `{"answer", "references"}` |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "empty_query", "message": "query must not be empty" } }
//! ```
//!
//! Codes and statuses: `bad_request`, `empty_query` and
//! `invalid_configuration` (400); `embedding_failure` and
//! `completion_failure` (502); everything else (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser front page
//! served elsewhere can call the API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use sidekick_core::answer::Orchestrator;
use sidekick_core::models::Answer;

use crate::ask::build_orchestrator;
use crate::config::Config;

/// Shared application state passed to route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Orchestrator,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }
}

/// Build the router with the query route mounted under `base_path`.
pub fn router(state: AppState, base_path: &str) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let query_path = format!("{}/api/query", base_path.trim_end_matches('/'));

    Router::new()
        .route(&query_path, post(handle_query))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Serve `app` on an already-bound listener until the process exits.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app).await?;
    Ok(())
}

/// Load the index at `index_path`, bind `[server].bind`, and serve.
pub async fn run_server(config: &Config, index_path: &Path) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(config, index_path).await?;
    let index = orchestrator.retriever().index();
    tracing::info!(
        path = %index_path.display(),
        documents = index.document_count(),
        chunks = index.len(),
        model = %index.manifest().embedding_model,
        "index loaded"
    );

    let app = router(AppState::new(orchestrator), &config.server.base_path);
    let listener = TcpListener::bind(&config.server.bind).await?;

    println!("Sidekick server listening on http://{}", listener.local_addr()?);
    println!(
        "  POST {}/api/query",
        config.server.base_path.trim_end_matches('/')
    );
    println!("  GET  /health");

    serve(listener, app).await
}

// ============ Error handling ============

/// JSON error body: `{ "error": { "code": "...", "message": "..." } }`.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"empty_query"`).
    code: String,
    /// Human-readable error message.
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

impl From<sidekick_core::Error> for AppError {
    fn from(err: sidekick_core::Error) -> Self {
        use sidekick_core::Error;

        let status = match &err {
            Error::EmptyQuery | Error::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            Error::EmbeddingFailure(_) | Error::CompletionFailure(_) => StatusCode::BAD_GATEWAY,
            Error::EmbeddingSpaceMismatch { .. } | Error::EmptyIndex | Error::Storage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

/// Constructs a 400 Bad Request error.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

// ============ Handlers ============

#[derive(Deserialize)]
struct QueryRequest {
    query: String,
}

/// `POST {base_path}/api/query`
async fn handle_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<Answer>, AppError> {
    let Json(request) = payload.map_err(|e| bad_request(e.body_text()))?;

    match state.orchestrator.answer(&request.query).await {
        Ok(answer) => {
            tracing::info!(references = answer.references.len(), "answered query");
            Ok(Json(answer))
        }
        Err(err) => {
            tracing::warn!(code = err.code(), error = %err, "query failed");
            Err(err.into())
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// `GET /health`
async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
