use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of progress reported by an [`ExecutionEvent`].
///
/// Serialized as the `type` field of the wire format. Ordering of events
/// within one stream is delivery-significant: clients render the sequence as
/// a timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A node is reasoning or about to act.
    Thinking,
    /// A coarse progress update.
    Status,
    /// One fragment of a node's textual output.
    Result,
    /// The task's final summary.
    Final,
    /// A task-fatal failure; the sequence ends after this.
    Error,
    /// Terminal sentinel; delivery stops after this event.
    End,
    /// Bootstrap event confirming an SSE connection was established.
    Connection,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Thinking => write!(f, "thinking"),
            EventKind::Status => write!(f, "status"),
            EventKind::Result => write!(f, "result"),
            EventKind::Final => write!(f, "final"),
            EventKind::Error => write!(f, "error"),
            EventKind::End => write!(f, "end"),
            EventKind::Connection => write!(f, "connection"),
        }
    }
}

/// One unit of observable progress on a task.
///
/// Produced by the task scheduler and graph execution, queued per stream by
/// the stream manager, and delivered to exactly one client as a single SSE
/// frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionEvent {
    /// The event taxonomy entry, serialized as `type`.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Human-readable display label of the reporting agent.
    pub agent: String,
    /// The textual payload.
    pub message: String,
    /// The graph node this event concerns, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<String>,
    /// The stream this event was delivered on. Filled in by the transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,
    /// UTC timestamp of emission.
    pub timestamp: DateTime<Utc>,
    /// Arbitrary additional fields, flattened into the wire object.
    #[serde(flatten, default)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ExecutionEvent {
    /// Creates a new event of the given kind.
    pub fn new(kind: EventKind, agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            agent: agent.into(),
            message: message.into(),
            node: None,
            stream_id: None,
            timestamp: Utc::now(),
            extra: HashMap::new(),
        }
    }

    /// Creates a `thinking` event attributed to a node.
    pub fn thinking(
        agent: impl Into<String>,
        message: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Thinking, agent, message).with_node(node)
    }

    /// Creates a `status` event attributed to a node.
    pub fn status(
        agent: impl Into<String>,
        message: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Status, agent, message).with_node(node)
    }

    /// Creates a `result` fragment event attributed to a node.
    pub fn result(
        agent: impl Into<String>,
        message: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        Self::new(EventKind::Result, agent, message).with_node(node)
    }

    /// Creates the `final` summary event.
    pub fn final_summary(agent: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(EventKind::Final, agent, message)
    }

    /// Creates an `error` event attributed to the system.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, "System", message)
    }

    /// Creates the terminal `end` event.
    pub fn end(message: impl Into<String>) -> Self {
        Self::new(EventKind::End, "System", message)
    }

    /// Creates the SSE bootstrap `connection` event.
    pub fn connection(stream_id: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Connection, "System", "Stream connection established");
        event.stream_id = Some(stream_id.into());
        event
    }

    /// Attaches a node identifier.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches an extra key-value pair to the wire object.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Whether this event terminates its stream.
    pub fn is_terminal(&self) -> bool {
        self.kind == EventKind::End
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_type_field() {
        let event = ExecutionEvent::thinking("Supervisor", "Analyzing the task...", "supervisor");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "thinking");
        assert_eq!(json["agent"], "Supervisor");
        assert_eq!(json["node"], "supervisor");
        assert!(json.get("stream_id").is_none());
    }

    #[test]
    fn test_extra_fields_flattened() {
        let event = ExecutionEvent::end("Task completed")
            .with_extra("agents_invoked", serde_json::json!(4));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["agents_invoked"], 4);
    }

    #[test]
    fn test_end_is_terminal() {
        assert!(ExecutionEvent::end("done").is_terminal());
        assert!(!ExecutionEvent::error("boom").is_terminal());
        assert!(!ExecutionEvent::connection("stream_x").is_terminal());
    }

    #[test]
    fn test_round_trip_preserves_extras() {
        let event = ExecutionEvent::end("Task completed")
            .with_extra("agents_invoked", serde_json::json!(2));
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ExecutionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, EventKind::End);
        assert_eq!(parsed.extra["agents_invoked"], serde_json::json!(2));
    }
}
