use crate::Worker;
use async_trait::async_trait;
use echelon_core::{EchelonResult, Message};
use tracing::info;

/// Document writer stub. Drafts a short report from the accumulated research.
pub struct DocumentWriter;

impl DocumentWriter {
    /// Creates the writer worker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocumentWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for DocumentWriter {
    fn name(&self) -> &str {
        "writer"
    }

    fn description(&self) -> &str {
        "Reads, writes and edits documents based on research findings."
    }

    async fn invoke(&self, instruction: &str, history: &[Message]) -> EchelonResult<Vec<Message>> {
        info!(worker = self.name(), "Drafting document");
        // Fold prior findings into the draft so downstream output reflects
        // what the research actually produced.
        let findings = history
            .iter()
            .filter(|m| !m.is_error && m.origin_node.is_some())
            .count();
        let content = format!(
            "Document written for: {instruction}. Drafted a structured report with an \
             introduction, key findings from {findings} source messages, and a conclusion."
        );
        Ok(vec![Message::from_node(self.name(), content)])
    }
}

/// Notebook stub. Captures working notes alongside the document.
pub struct NotebookWriter;

impl NotebookWriter {
    /// Creates the notebook worker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for NotebookWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for NotebookWriter {
    fn name(&self) -> &str {
        "notebook"
    }

    fn description(&self) -> &str {
        "Creates and manages working notes."
    }

    async fn invoke(&self, instruction: &str, _history: &[Message]) -> EchelonResult<Vec<Message>> {
        info!(worker = self.name(), "Creating notebook");
        let content = format!("Notebook created for: {instruction}. Logged outline and open points.");
        Ok(vec![Message::from_node(self.name(), content)])
    }
}

/// Chart generator stub. Summarizes data as a described visualization.
pub struct ChartGenerator;

impl ChartGenerator {
    /// Creates the chart worker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for ChartGenerator {
    fn name(&self) -> &str {
        "chart_generator"
    }

    fn description(&self) -> &str {
        "Generates charts from collected data."
    }

    async fn invoke(&self, instruction: &str, _history: &[Message]) -> EchelonResult<Vec<Message>> {
        info!(worker = self.name(), "Generating chart");
        let content = format!("Chart generated for: {instruction}. Produced a bar chart of the key figures.");
        Ok(vec![Message::from_node(self.name(), content)])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_writer_counts_prior_findings() {
        let history = vec![
            Message::user("write a report"),
            Message::from_node("searcher", "WebSearch result for: report"),
            Message::error_from_node("web_crawler", "timeout"),
        ];
        let out = DocumentWriter::new().invoke("report", &history).await.unwrap();
        // The error-flagged message is not counted as a finding.
        assert!(out[0].content.contains("1 source messages"));
    }

    #[tokio::test]
    async fn test_chart_generator_output() {
        let out = ChartGenerator::new().invoke("usage data", &[]).await.unwrap();
        assert_eq!(out[0].origin_node.as_deref(), Some("chart_generator"));
        assert!(out[0].content.contains("usage data"));
    }
}
