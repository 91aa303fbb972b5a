use crate::chat::{chat_handler, stream_chat_handler};
use crate::validate::MAX_TASK_LEN;
use axum::{extract::State, response::IntoResponse, routing::get, routing::post, Json, Router};
use echelon_stream::StreamManager;
use echelon_team::{describe, TaskScheduler};
use std::sync::Arc;

/// Shared application state, injected into every handler.
pub struct AppState {
    /// The task scheduler driving the team hierarchy.
    pub scheduler: Arc<TaskScheduler>,
    /// The per-client stream registry.
    pub streams: Arc<StreamManager>,
    /// Precomputed hierarchy description served by `/agents`.
    pub hierarchy: serde_json::Value,
    /// Task length limit applied before any stream is created.
    pub max_task_len: usize,
}

/// The gateway server builder.
pub struct GatewayServer;

impl GatewayServer {
    /// Builds the router with the default task length limit.
    pub fn build(scheduler: Arc<TaskScheduler>, streams: Arc<StreamManager>) -> Router {
        Self::build_with_limit(scheduler, streams, MAX_TASK_LEN)
    }

    /// Builds the router with an explicit task length limit.
    pub fn build_with_limit(
        scheduler: Arc<TaskScheduler>,
        streams: Arc<StreamManager>,
        max_task_len: usize,
    ) -> Router {
        let hierarchy =
            serde_json::to_value(describe(scheduler.graph())).unwrap_or_else(|_| serde_json::json!({}));

        let state = Arc::new(AppState {
            scheduler,
            streams,
            hierarchy,
            max_task_len,
        });

        Router::new()
            .route("/chat", post(chat_handler))
            .route("/stream-chat", post(stream_chat_handler))
            .route("/health", get(health_handler))
            .route("/agents", get(agents_handler))
            .with_state(state)
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "echelon",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn agents_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.hierarchy.clone())
}
