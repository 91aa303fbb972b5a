//! Per-client event streams and SSE delivery.
//!
//! The [`StreamManager`] keeps a registry of independent, addressable FIFO
//! queues — one per in-flight client request — decoupling event production
//! (the task scheduler's driver) from delivery (the SSE response body).
//! [`sse::DeliveryStream`] drains one queue into SSE frames and guarantees
//! registry cleanup on every exit path.
//!
//! # Main types
//!
//! - [`StreamManager`] — Injectable registry of per-client event queues.
//! - [`sse::DeliveryStream`] — SSE frame stream over one queue.
//! - [`sse::format_frame`] — The `data: <json>\n\n` wire encoding.

/// Stream registry.
pub mod manager;
/// SSE frame encoding and delivery.
pub mod sse;

pub use manager::StreamManager;
pub use sse::{format_frame, DeliveryStream};
