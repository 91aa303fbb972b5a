use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single entry in a task's conversation history.
///
/// The history is append-only and ordered; it is owned by the task scheduler
/// for the duration of one task and shared with every node the task visits.
/// Worker and sub-team output is tagged with the producing node's identifier
/// via [`origin_node`](Message::origin_node).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// The author of the message: `"user"` for the submitted task, otherwise
    /// the identifier of the node that produced it.
    pub author: String,
    /// The textual content of the message.
    pub content: String,
    /// The graph node that produced this message, if any.
    pub origin_node: Option<String>,
    /// Whether this message is one fragment of a larger incremental output.
    #[serde(default)]
    pub partial: bool,
    /// Whether this message records a worker failure.
    #[serde(default)]
    pub is_error: bool,
    /// UTC timestamp of when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message from the given author.
    pub fn new(author: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            content: content.into(),
            origin_node: None,
            partial: false,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Creates the initial user message that seeds a task's history.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Creates a message produced by a graph node, tagged with its identifier.
    pub fn from_node(node: impl Into<String>, content: impl Into<String>) -> Self {
        let node = node.into();
        let mut msg = Self::new(node.clone(), content);
        msg.origin_node = Some(node);
        msg
    }

    /// Creates an error-flagged message recording a worker failure.
    ///
    /// Worker failures are fed back into history as data so the supervisor can
    /// observe them and re-route, instead of aborting the whole task.
    pub fn error_from_node(node: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::from_node(node, content);
        msg.is_error = true;
        msg
    }

    /// Marks this message as one fragment of an incremental output.
    pub fn partial(mut self) -> Self {
        self.partial = true;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message() {
        let msg = Message::user("Research AI agents");
        assert_eq!(msg.author, "user");
        assert_eq!(msg.content, "Research AI agents");
        assert!(msg.origin_node.is_none());
        assert!(!msg.is_error);
    }

    #[test]
    fn test_node_message_tagged_with_origin() {
        let msg = Message::from_node("searcher", "WebSearch result for: agents");
        assert_eq!(msg.author, "searcher");
        assert_eq!(msg.origin_node.as_deref(), Some("searcher"));
    }

    #[test]
    fn test_error_message_flagged() {
        let msg = Message::error_from_node("web_crawler", "connection refused");
        assert!(msg.is_error);
        assert_eq!(msg.origin_node.as_deref(), Some("web_crawler"));
    }

    #[test]
    fn test_message_serialization_round_trip() {
        let msg = Message::from_node("writer", "Document written").partial();
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.content, "Document written");
        assert!(parsed.partial);
        assert_eq!(parsed.origin_node.as_deref(), Some("writer"));
    }
}
