//! HTTP gateway for the Echelon orchestration engine.
//!
//! Exposes the task scheduler over a small axum surface:
//!
//! - `POST /chat` — run a task to completion, return the collected result.
//! - `POST /stream-chat` — run a task in the background, stream progress
//!   events over SSE.
//! - `GET /health` — liveness probe.
//! - `GET /agents` — the configured team hierarchy.
//!
//! Task input is validated before any stream is created; invalid tasks are
//! rejected with a descriptive 400 response.

/// Chat endpoints and the stream driver.
pub mod chat;
/// Router assembly and shared state.
pub mod server;
/// Task input validation.
pub mod validate;

pub use server::{AppState, GatewayServer};
pub use validate::{validate_task_input, InvalidTask, MAX_TASK_LEN};
