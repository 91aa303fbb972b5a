//! Worker capabilities for Echelon team graphs.
//!
//! A worker is an opaque unit that accepts a textual instruction plus the
//! running message history and asynchronously produces tagged result messages
//! or fails. Workers are grouped into named pools that the hierarchy composer
//! binds to team graphs.
//!
//! The concrete workers in this crate are stubs: they produce canned output
//! describing the action they would take. Real capabilities (search backends,
//! document stores, charting services) plug in behind the same [`Worker`]
//! trait.
//!
//! # Main types
//!
//! - [`Worker`] — The capability interface invoked by team graphs.
//! - [`WorkerPool`] — A named group of workers.
//! - [`research_pool()`] / [`writing_pool()`] — The standard pools.

/// Research-oriented worker stubs (search, crawling).
pub mod research;
/// Writing-oriented worker stubs (documents, notebooks, charts).
pub mod writing;

use async_trait::async_trait;
use echelon_core::{EchelonResult, Message};
use std::sync::Arc;

pub use research::{WebCrawler, WebSearch};
pub use writing::{ChartGenerator, DocumentWriter, NotebookWriter};

/// A task-executing capability that a supervisor can route to.
///
/// Implementations must be cheap to share (`Arc<dyn Worker>`); one instance
/// may serve many concurrent tasks.
#[async_trait]
pub trait Worker: Send + Sync {
    /// The node identifier this worker is registered under.
    fn name(&self) -> &str;

    /// One-line description of the capability, used by the gateway's
    /// hierarchy listing.
    fn description(&self) -> &str;

    /// Executes the instruction against the given history.
    ///
    /// Returns the messages to append to the task history, each tagged with
    /// this worker's identifier. A failure is returned as an error outcome;
    /// the enclosing graph converts it into an error-flagged message rather
    /// than aborting the task.
    async fn invoke(&self, instruction: &str, history: &[Message]) -> EchelonResult<Vec<Message>>;
}

/// A named group of workers exposed to the hierarchy composer.
#[derive(Clone)]
pub struct WorkerPool {
    name: String,
    workers: Vec<Arc<dyn Worker>>,
}

impl WorkerPool {
    /// Creates an empty pool with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            workers: Vec::new(),
        }
    }

    /// Adds a worker to the pool.
    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.workers.push(worker);
        self
    }

    /// The pool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The workers in registration order.
    pub fn workers(&self) -> &[Arc<dyn Worker>] {
        &self.workers
    }

    /// Number of workers in the pool.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Whether the pool has no workers.
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

/// The standard research pool: web search plus page crawling.
pub fn research_pool() -> WorkerPool {
    WorkerPool::new("research")
        .with_worker(Arc::new(WebSearch::new()))
        .with_worker(Arc::new(WebCrawler::new()))
}

/// The standard writing pool: documents, notebooks, and charts.
pub fn writing_pool() -> WorkerPool {
    WorkerPool::new("writing")
        .with_worker(Arc::new(DocumentWriter::new()))
        .with_worker(Arc::new(NotebookWriter::new()))
        .with_worker(Arc::new(ChartGenerator::new()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_pools() {
        let research = research_pool();
        assert_eq!(research.name(), "research");
        assert_eq!(research.len(), 2);

        let writing = writing_pool();
        assert_eq!(writing.name(), "writing");
        assert_eq!(writing.len(), 3);
        assert!(!writing.is_empty());
    }

    #[tokio::test]
    async fn test_worker_output_is_tagged() {
        let worker = WebSearch::new();
        let messages = worker.invoke("AI agents", &[]).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].origin_node.as_deref(), Some("searcher"));
        assert!(messages[0].content.contains("AI agents"));
    }
}
