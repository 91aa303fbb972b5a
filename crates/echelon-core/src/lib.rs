//! Core types and error definitions for the Echelon orchestration system.
//!
//! This crate provides the foundational types shared across all Echelon
//! crates: the task message history, the progress event taxonomy, and the
//! unified error enum.
//!
//! # Main types
//!
//! - [`EchelonError`] — Unified error enum for all Echelon subsystems.
//! - [`EchelonResult`] — Convenience alias for `Result<T, EchelonError>`.
//! - [`Message`] — One entry in a task's append-only conversation history.
//! - [`ExecutionEvent`] — One unit of observable progress on a task.
//! - [`EventKind`] — The progress event taxonomy.

/// Progress event taxonomy and wire representation.
pub mod event;
/// Task message history entries.
pub mod message;

pub use event::{EventKind, ExecutionEvent};
pub use message::Message;

/// Top-level error type for the Echelon system.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum EchelonError {
    /// An error from a routing decision function.
    #[error("Router error: {0}")]
    Router(String),

    /// An error raised by a worker capability during invocation.
    #[error("Worker error: {0}")]
    Worker(String),

    /// An error in team graph execution.
    #[error("Graph error: {0}")]
    Graph(String),

    /// A team graph exceeded its configured supervisor decision limit.
    #[error("Step limit of {limit} supervisor decisions exceeded in team '{team}'")]
    StepLimit {
        /// The team graph that hit the limit.
        team: String,
        /// The configured maximum number of supervisor decisions.
        limit: usize,
    },

    /// An error assembling a team hierarchy.
    #[error("Compose error: {0}")]
    Compose(String),

    /// An error in the stream registry or event delivery.
    #[error("Stream error: {0}")]
    Stream(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`EchelonError`].
pub type EchelonResult<T> = Result<T, EchelonError>;
