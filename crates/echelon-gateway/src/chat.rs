use crate::server::AppState;
use crate::validate::validate_task_with_limit;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use echelon_core::EventKind;
use echelon_stream::{DeliveryStream, StreamManager};
use echelon_team::TaskScheduler;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// A task submission.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The task text.
    pub task: String,
    /// Whether the client intends to stream. Kept for wire compatibility;
    /// `/chat` always answers synchronously.
    #[serde(default = "default_stream")]
    pub stream: bool,
}

fn default_stream() -> bool {
    true
}

/// Synchronous chat response envelope.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Whether the task ran to completion.
    pub success: bool,
    /// Human-readable outcome summary.
    pub message: String,
    /// Task, final result, and the full event sequence.
    pub data: serde_json::Value,
    /// Response timestamp, RFC 3339.
    pub timestamp: String,
}

fn reject(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": true, "message": message })),
    )
        .into_response()
}

/// `POST /chat` — runs the task to completion and returns the collected
/// event sequence plus the final summary.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if let Err(e) = validate_task_with_limit(&request.task, state.max_task_len) {
        warn!(error = %e, "Rejected chat request");
        return reject(e.to_string());
    }

    info!(task = %request.task, "Synchronous chat request");
    let events = state.scheduler.run_task_collected(&request.task).await;

    let final_message = events
        .iter()
        .find(|e| e.kind == EventKind::Final)
        .map(|e| e.message.clone())
        .unwrap_or_default();
    let failed = events.iter().any(|e| e.kind == EventKind::Error);

    let response = ChatResponse {
        success: !failed,
        message: if failed {
            "Task execution failed".to_string()
        } else {
            "Task execution completed".to_string()
        },
        data: serde_json::json!({
            "task": request.task,
            "result": final_message,
            "steps": events,
        }),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(response).into_response()
}

/// `POST /stream-chat` — validates the task, allocates a stream, starts the
/// background driver, and answers with the live SSE event sequence.
pub async fn stream_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Response {
    if let Err(e) = validate_task_with_limit(&request.task, state.max_task_len) {
        warn!(error = %e, "Rejected stream-chat request");
        return reject(e.to_string());
    }

    let stream_id = state.streams.create();
    info!(stream_id = %stream_id, task = %request.task, "Streaming chat request");

    tokio::spawn(drive_stream(
        state.scheduler.clone(),
        state.streams.clone(),
        stream_id.clone(),
        request.task,
    ));

    let Some(delivery) = DeliveryStream::attach(state.streams.clone(), &stream_id) else {
        // Unreachable in practice: the stream was created two lines up.
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": true, "message": "stream vanished" })),
        )
            .into_response();
    };

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (HeaderName::from_static("x-accel-buffering"), "no"),
        ],
        Body::from_stream(delivery),
    )
        .into_response()
}

/// Forwards scheduler events into the stream queue, then closes the stream.
///
/// A failed send means the client disconnected and the stream was removed;
/// the driver stops immediately, and dropping the event receiver cancels the
/// scheduler's background run.
async fn drive_stream(
    scheduler: Arc<TaskScheduler>,
    streams: Arc<StreamManager>,
    stream_id: String,
    task: String,
) {
    let mut events = scheduler.run_task(task);
    while let Some(event) = events.recv().await {
        if !streams.send(&stream_id, event) {
            info!(stream_id = %stream_id, "Consumer gone, stopping event driver");
            return;
        }
    }
    // The scheduler's sequence is done (ending in `end` or `error`); the
    // transport-level end sentinel is enqueued regardless, matching what the
    // delivery loop terminates on.
    streams.close(&stream_id);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use echelon_team::{default_hierarchy, SchedulerConfig, SequentialRouter, DEFAULT_STEP_LIMIT};
    use std::time::Duration;

    fn scheduler() -> Arc<TaskScheduler> {
        let graph =
            default_hierarchy(Arc::new(SequentialRouter::new()), DEFAULT_STEP_LIMIT).unwrap();
        Arc::new(TaskScheduler::new(
            graph,
            SchedulerConfig {
                pacing: Duration::ZERO,
            },
        ))
    }

    #[tokio::test]
    async fn test_driver_forwards_all_events_and_closes() {
        let streams = StreamManager::new();
        let id = streams.create();

        drive_stream(
            scheduler(),
            streams.clone(),
            id.clone(),
            "Research something".to_string(),
        )
        .await;

        let mut rx = streams.take_receiver(&id).unwrap();
        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        // Scheduler's own end, then the transport close sentinel.
        assert!(kinds.len() > 2);
        assert_eq!(kinds[0], EventKind::Status);
        assert_eq!(kinds[kinds.len() - 2], EventKind::End);
        assert_eq!(kinds[kinds.len() - 1], EventKind::End);
    }

    #[tokio::test]
    async fn test_driver_stops_when_stream_removed() {
        let streams = StreamManager::new();
        let id = streams.create();
        streams.remove(&id);

        // Must return promptly instead of forwarding into the void.
        drive_stream(
            scheduler(),
            streams.clone(),
            id.clone(),
            "Research something".to_string(),
        )
        .await;
        assert!(!streams.contains(&id));
    }
}
