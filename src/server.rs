use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Request, State, rejection::JsonRejection},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    routing::{get, get_service, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use tracing::info;

use crate::AppState;
use crate::config::AppConfig;
use crate::faq::{FaqQuery, FaqStore, watcher};
use crate::security::rate_limit::rate_limit_middleware;

/// Error message for a `/chat` request without a usable role or message.
pub const MISSING_FIELDS_ERROR: &str = "role and message are required";

/// Error message for a body over `resilience.body_limit_bytes`.
pub const BODY_TOO_LARGE_ERROR: &str = "request body too large";

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let faq = FaqStore::open(config.faq_path());

    if let Some(every) = config.faq.reload_interval() {
        tokio::spawn(watcher::watch(faq.clone(), every));
    }

    let state = AppState::new(Arc::clone(&config), faq);
    let app = build_router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the application router with all middleware attached.
pub fn build_router(state: AppState) -> Router {
    let static_dir = PathBuf::from(&state.config.server.static_dir);
    let body_limit = state.config.resilience.body_limit_bytes;

    Router::new()
        .route(
            "/",
            get_service(ServeFile::new(static_dir.join("index.html"))),
        )
        .nest_service("/static", ServeDir::new(&static_dir))
        .route("/chat", post(chat))
        .route("/api/faq/stats", get(faq_stats))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            timeout_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

/// Answer 408 when the rest of the stack takes longer than
/// `resilience.request_timeout()`.
pub async fn timeout_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let limit = state.config.resilience.request_timeout();
    let path = req.uri().path().to_owned();
    match tokio::time::timeout(limit, next.run(req)).await {
        Ok(res) => res,
        Err(_) => {
            tracing::warn!(
                name: "http.timed_out",
                path = %path,
                timeout_secs = limit.as_secs(),
                "Request timed out"
            );
            (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Request body for the chat endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// Caller-selected persona, e.g. `student` or `parent`.
    #[serde(default)]
    pub role: Option<String>,
    /// The question text.
    #[serde(default)]
    pub message: Option<String>,
}

/// Successful chat reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// JSON error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// FAQ table statistics.
#[derive(Debug, Serialize, Deserialize)]
pub struct FaqStats {
    pub rows: usize,
    pub source: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

/// POST /chat - Answer a question from the FAQ table.
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    let request_id = uuid::Uuid::new_v4();

    // Unreadable bodies are treated as empty ones; oversized ones are not.
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            tracing::info!(request_id = %request_id, "Rejected oversized chat body");
            return Err((
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(ErrorBody {
                    error: BODY_TOO_LARGE_ERROR.to_string(),
                }),
            ));
        }
        Err(rejection) => {
            tracing::debug!(
                request_id = %request_id,
                error = %rejection,
                "Unreadable chat body"
            );
            ChatRequest::default()
        }
    };

    let Some(query) = FaqQuery::new(
        req.role.as_deref().unwrap_or_default(),
        req.message.as_deref().unwrap_or_default(),
    ) else {
        tracing::info!(request_id = %request_id, "Rejected chat request without role or message");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: MISSING_FIELDS_ERROR.to_string(),
            }),
        ));
    };

    let book = state.faq.current();
    let hit = book.lookup(&query);

    tracing::info!(
        request_id = %request_id,
        role = %query.role(),
        query_length = query.text().len(),
        matched = hit.is_some(),
        "Answered chat request"
    );
    tracing::trace!(request_id = %request_id, query = %query.text(), "Chat query");

    Ok(Json(ChatResponse {
        answer: book.answer(&query).to_string(),
    }))
}

/// GET /api/faq/stats - Size and origin of the FAQ table being served.
async fn faq_stats(State(state): State<AppState>) -> Json<FaqStats> {
    let book = state.faq.current();
    Json(FaqStats {
        rows: book.len(),
        source: book.source().map(|p| p.display().to_string()),
        loaded_at: book.loaded_at(),
    })
}

/// GET /health - Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
