use crate::composer::display_name;
use crate::graph::TeamGraph;
use crate::planner::{KeywordPlanner, Planner};
use echelon_core::{EchelonError, ExecutionEvent, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Words-per-fragment divisor for the composed final answer.
const SUMMARY_DIVISOR: usize = 20;
/// Words-per-fragment divisor for per-node streaming output.
const NODE_DIVISOR: usize = 10;
/// Upper bound on words per emitted fragment.
const MAX_CHUNK_WORDS: usize = 5;

/// Tuning knobs for event emission.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Artificial delay between emitted events, smoothing delivery rate.
    /// Purely cosmetic; correctness never depends on it.
    pub pacing: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(20),
        }
    }
}

/// Drives one task through the team hierarchy and emits progress events.
///
/// [`run_task`](TaskScheduler::run_task) accepts one task, runs the root
/// graph to completion on a background tokio task, and yields a finite FIFO
/// sequence of [`ExecutionEvent`]s through the returned receiver. The
/// sequence is not restartable; a fresh invocation re-runs the whole
/// hierarchy.
pub struct TaskScheduler {
    graph: Arc<TeamGraph>,
    planner: Arc<dyn Planner>,
    config: SchedulerConfig,
}

impl TaskScheduler {
    /// Creates a scheduler over the given root graph with the default
    /// keyword planner.
    pub fn new(graph: TeamGraph, config: SchedulerConfig) -> Self {
        Self {
            graph: Arc::new(graph),
            planner: Arc::new(KeywordPlanner::new()),
            config,
        }
    }

    /// Replaces the plan-preview heuristic.
    pub fn with_planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    /// The root graph this scheduler drives.
    pub fn graph(&self) -> &Arc<TeamGraph> {
        &self.graph
    }

    /// Runs one task, returning the event sequence.
    ///
    /// Any failure during execution is caught at this boundary and converted
    /// into a single `error` event; the channel then closes. Dropping the
    /// receiver cancels the background run: the next emission fails and the
    /// graph task is aborted, freeing worker resources promptly.
    pub fn run_task(&self, task: impl Into<String>) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let graph = self.graph.clone();
        let planner = self.planner.clone();
        let pacing = self.config.pacing;
        let task = task.into();

        tokio::spawn(async move {
            match drive(graph, planner, pacing, task, &tx).await {
                Ok(()) => {}
                Err(Stop::Cancelled) => {
                    info!("Event consumer went away, task run cancelled");
                }
                Err(Stop::Failed(e)) => {
                    warn!(error = %e, "Task execution failed");
                    let _ = tx.send(ExecutionEvent::error(format!("Task execution failed: {e}")));
                }
            }
        });

        rx
    }

    /// Runs one task to completion and collects the full event sequence.
    /// Used by the synchronous chat endpoint.
    pub async fn run_task_collected(&self, task: impl Into<String>) -> Vec<ExecutionEvent> {
        let mut rx = self.run_task(task);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }
}

/// Splits `text` on whitespace and groups it into fragments of
/// `clamp(words / divisor, 1, MAX_CHUNK_WORDS)` words each.
///
/// Concatenating the fragments in order, rejoined with single spaces,
/// reconstructs the input modulo whitespace normalization.
pub fn chunk_words(text: &str, divisor: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let size = (words.len() / divisor).clamp(1, MAX_CHUNK_WORDS);
    words.chunks(size).map(|chunk| chunk.join(" ")).collect()
}

fn display_label(node: &str) -> String {
    display_name(node).map_or_else(|| node.to_string(), str::to_string)
}

enum Stop {
    /// The event receiver was dropped; stop silently.
    Cancelled,
    /// Graph execution failed; surface one error event.
    Failed(EchelonError),
}

async fn emit(
    tx: &mpsc::UnboundedSender<ExecutionEvent>,
    pacing: Duration,
    event: ExecutionEvent,
) -> Result<(), Stop> {
    tx.send(event).map_err(|_| Stop::Cancelled)?;
    if !pacing.is_zero() {
        tokio::time::sleep(pacing).await;
    }
    Ok(())
}

async fn drive(
    graph: Arc<TeamGraph>,
    planner: Arc<dyn Planner>,
    pacing: Duration,
    task: String,
    tx: &mpsc::UnboundedSender<ExecutionEvent>,
) -> Result<(), Stop> {
    info!(task = %task, "Task received");
    emit(
        tx,
        pacing,
        ExecutionEvent::status("System", "Task received, dispatching to the team hierarchy...", "system"),
    )
    .await?;

    for line in planner.preview(&task) {
        emit(tx, pacing, ExecutionEvent::thinking("Supervisor", line, "supervisor")).await?;
    }

    // Run the graph concurrently and observe member visits as they happen.
    let (visit_tx, mut visit_rx) = mpsc::unbounded_channel();
    let graph_task = tokio::spawn({
        let graph = graph.clone();
        let task = task.clone();
        async move {
            let mut history = vec![Message::user(task)];
            graph.run(&mut history, Some(&visit_tx)).await.map(|()| history)
        }
    });

    // Distinct nodes that produced at least one tagged message, in first-seen
    // order.
    let mut contributors: Vec<String> = Vec::new();
    let mut cancelled = false;

    while let Some(visit) = visit_rx.recv().await {
        if !visit.messages.is_empty() && !contributors.contains(&visit.node) {
            contributors.push(visit.node.clone());
        }
        if stream_visit(tx, pacing, &visit).await.is_err() {
            cancelled = true;
            break;
        }
    }

    if cancelled {
        graph_task.abort();
        return Err(Stop::Cancelled);
    }

    let history = match graph_task.await {
        Ok(Ok(history)) => history,
        Ok(Err(e)) => return Err(Stop::Failed(e)),
        Err(e) => {
            return Err(Stop::Failed(EchelonError::Graph(format!(
                "task driver panicked: {e}"
            ))))
        }
    };

    // Compose and stream the final answer from every tagged message, in
    // history order, the same way a supervisor would read it back.
    let final_answer = history
        .iter()
        .filter(|m| m.origin_node.is_some())
        .map(|m| {
            let author = m.origin_node.as_deref().unwrap_or(&m.author);
            format!("[{}] {}", display_label(author), m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    if !final_answer.is_empty() {
        emit(
            tx,
            pacing,
            ExecutionEvent::thinking("Supervisor", "Composing the final answer...", "supervisor"),
        )
        .await?;
        for chunk in chunk_words(&final_answer, SUMMARY_DIVISOR) {
            emit(tx, pacing, ExecutionEvent::result("Supervisor", chunk, "supervisor")).await?;
        }
    }

    let displays: Vec<String> = contributors.iter().map(|n| display_label(n)).collect();
    let summary = if displays.is_empty() {
        "Task complete. No agents produced output.".to_string()
    } else {
        format!("Task complete. Contributing agents: {}.", displays.join(", "))
    };
    emit(
        tx,
        pacing,
        ExecutionEvent::final_summary("Supervisor", summary)
            .with_node("supervisor")
            .with_extra("agents", serde_json::json!(contributors)),
    )
    .await?;

    emit(
        tx,
        pacing,
        ExecutionEvent::end("Task execution finished")
            .with_extra("agents_invoked", serde_json::json!(contributors.len())),
    )
    .await?;

    info!(agents = contributors.len(), "Task finished");
    Ok(())
}

async fn stream_visit(
    tx: &mpsc::UnboundedSender<ExecutionEvent>,
    pacing: Duration,
    visit: &crate::graph::NodeVisit,
) -> Result<(), Stop> {
    let display = display_label(&visit.node);

    emit(
        tx,
        pacing,
        ExecutionEvent::thinking(
            display.clone(),
            format!("{display} is working on the sub-task..."),
            visit.node.clone(),
        ),
    )
    .await?;

    let text = visit
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    for chunk in chunk_words(&text, NODE_DIVISOR) {
        emit(
            tx,
            pacing,
            ExecutionEvent::result(display.clone(), chunk, visit.node.clone()),
        )
        .await?;
    }

    emit(
        tx,
        pacing,
        ExecutionEvent::status(display.clone(), format!("{display} completed"), visit.node.clone()),
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_words_short_text_one_word_chunks() {
        // 4 words / 10 -> clamp to 1 word per fragment.
        let chunks = chunk_words("alpha beta gamma delta", NODE_DIVISOR);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], "alpha");
    }

    #[test]
    fn test_chunk_words_long_text_capped_at_five() {
        let text = vec!["word"; 500].join(" ");
        let chunks = chunk_words(&text, SUMMARY_DIVISOR);
        // 500 / 20 = 25, clamped to 5 words per fragment.
        assert_eq!(chunks.len(), 100);
        assert_eq!(chunks[0].split_whitespace().count(), 5);
    }

    #[test]
    fn test_chunk_words_reconstructs_input() {
        let text = "The quick brown fox jumps over the lazy dog repeatedly and often";
        let rejoined = chunk_words(text, NODE_DIVISOR).join(" ");
        assert_eq!(rejoined, text);
    }

    #[test]
    fn test_chunk_words_empty() {
        assert!(chunk_words("   ", NODE_DIVISOR).is_empty());
    }
}
