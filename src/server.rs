//! JSON HTTP service over a [`Searcher`].
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness
//! - `GET /stats`: document count, searched fields, current weights
//! - `GET /authors`: distinct authors for filtering
//! - `POST /search`: `{query, top_k?, author?}` → search outcome
//! - `GET /weights`: current ranking weights
//! - `PUT /weights`: replace all three weights (numbers or numeric strings)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use pagesift_rank::{ConfigError, FieldBoost, SearchError, SearchRequest, Searcher, WeightConfig};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body of `POST /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBody {
    /// Query text.
    pub query: String,
    /// Maximum number of documents; the configured default when absent.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Restrict to one author; blank means no filter.
    #[serde(default)]
    pub author: Option<String>,
}

/// A weight given as a JSON number or as numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightValue {
    /// `1.5`
    Number(f64),
    /// `"1.5"`
    Text(String),
}

impl WeightValue {
    fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Body of `PUT /weights`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsBody {
    /// Proximity weight.
    pub proximity_weight: WeightValue,
    /// Position weight.
    pub position_weight: WeightValue,
    /// Rarity weight.
    pub idf_weight: WeightValue,
}

impl WeightsBody {
    /// Parse into a validated config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotANumber`] or [`ConfigError::Validation`].
    pub fn to_config(&self) -> std::result::Result<WeightConfig, ConfigError> {
        WeightConfig::parse(
            &self.proximity_weight.as_text(),
            &self.position_weight.as_text(),
            &self.idf_weight.as_text(),
        )
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// `GET /health` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// `GET /stats` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Indexed pages.
    pub document_count: u64,
    /// Searched fields and boosts.
    pub fields: Vec<FieldBoost>,
    /// Current ranking weights.
    pub weights: WeightConfig,
}

/// `GET /authors` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorsResponse {
    /// Sorted author names, `"Unknown"` for pages without one.
    pub authors: Vec<String>,
}

/// Error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
    /// `"invalid_request"` or `"server_error"`.
    pub kind: String,
}

fn error_response(status: StatusCode, message: String) -> Response {
    let kind = if status.is_client_error() {
        "invalid_request"
    } else {
        "server_error"
    };
    let body = ErrorResponse {
        error: message,
        kind: kind.to_owned(),
    };
    (status, Json(body)).into_response()
}

/// Unwrap a JSON body, turning axum's rejection (bad syntax, wrong types,
/// missing fields, wrong content type) into an [`ErrorResponse`].
fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> std::result::Result<T, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            tracing::debug!(status = %rejection.status(), "request body rejected");
            Err(error_response(rejection.status(), rejection.body_text()))
        }
    }
}

fn search_error_status(err: &SearchError) -> StatusCode {
    match err {
        SearchError::QueryParse(_) | SearchError::Config(_) => StatusCode::BAD_REQUEST,
        SearchError::Index(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn config_error_status(err: &ConfigError) -> StatusCode {
    match err {
        ConfigError::Validation { .. } | ConfigError::NotANumber { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// SearchServer
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct AppState {
    searcher: Arc<Searcher>,
}

/// Build the service router.
pub fn router(searcher: Arc<Searcher>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route("/authors", get(handle_authors))
        .route("/search", post(handle_search))
        .route("/weights", get(handle_get_weights).put(handle_put_weights))
        .with_state(AppState { searcher })
}

/// HTTP server running in a background tokio task.
pub struct SearchServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl SearchServer {
    /// Start serving.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign).
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(searcher: Arc<Searcher>, config: &ServerConfig) -> Result<Self> {
        let app = router(searcher);

        let bind_addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("bind to {bind_addr} failed: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AppError::Server(format!("failed to get local addr: {e}")))?;

        info!("search service listening on http://{addr}");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("search service error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for SearchServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
    })
}

async fn handle_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let searcher = &state.searcher;
    Json(StatsResponse {
        document_count: searcher.document_count(),
        fields: searcher.config().fields.clone(),
        weights: searcher.weights(),
    })
}

async fn handle_authors(State(state): State<AppState>) -> Json<AuthorsResponse> {
    Json(AuthorsResponse {
        authors: state.searcher.authors(),
    })
}

/// `POST /search`. Retrieval is synchronous, so this runs on the blocking pool.
async fn handle_search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchBody>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let top_k = body
        .top_k
        .unwrap_or(state.searcher.config().default_top_k);
    let mut request = SearchRequest::new(body.query, top_k);
    request.author = body.author.filter(|a| !a.trim().is_empty());

    let searcher = Arc::clone(&state.searcher);
    let outcome = tokio::task::spawn_blocking(move || searcher.search_request(&request)).await;

    match outcome {
        Ok(Ok(outcome)) => Json(outcome).into_response(),
        Ok(Err(err)) => {
            tracing::debug!(error = %err, "search rejected");
            error_response(search_error_status(&err), err.to_string())
        }
        Err(join_err) => {
            tracing::error!("search task failed: {join_err}");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "search task failed".to_owned())
        }
    }
}

async fn handle_get_weights(State(state): State<AppState>) -> Json<WeightConfig> {
    Json(state.searcher.weights())
}

/// `PUT /weights`. The update persists to disk, so it also runs blocking.
async fn handle_put_weights(
    State(state): State<AppState>,
    payload: std::result::Result<Json<WeightsBody>, JsonRejection>,
) -> Response {
    let body = match json_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let candidate = match body.to_config() {
        Ok(candidate) => candidate,
        Err(err) => return error_response(config_error_status(&err), err.to_string()),
    };

    let searcher = Arc::clone(&state.searcher);
    let updated =
        tokio::task::spawn_blocking(move || searcher.weight_store().update(candidate)).await;

    match updated {
        Ok(Ok(())) => Json(candidate).into_response(),
        Ok(Err(err)) => error_response(config_error_status(&err), err.to_string()),
        Err(join_err) => {
            tracing::error!("weight update task failed: {join_err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "weight update task failed".to_owned(),
            )
        }
    }
}
