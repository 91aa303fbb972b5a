use crate::Worker;
use async_trait::async_trait;
use echelon_core::{EchelonResult, Message};
use tracing::info;

/// Web search stub. Produces a canned search summary for the instruction.
pub struct WebSearch;

impl WebSearch {
    /// Creates the search worker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for WebSearch {
    fn name(&self) -> &str {
        "searcher"
    }

    fn description(&self) -> &str {
        "Searches the web for information relevant to the task."
    }

    async fn invoke(&self, instruction: &str, _history: &[Message]) -> EchelonResult<Vec<Message>> {
        info!(worker = self.name(), "Running web search");
        let content = format!(
            "WebSearch result for: {instruction}. Found recent articles, papers and \
             overviews covering the requested topic."
        );
        Ok(vec![Message::from_node(self.name(), content)])
    }
}

/// Web crawler stub. Produces a canned page-extraction summary.
pub struct WebCrawler;

impl WebCrawler {
    /// Creates the crawler worker.
    pub fn new() -> Self {
        Self
    }
}

impl Default for WebCrawler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Worker for WebCrawler {
    fn name(&self) -> &str {
        "web_crawler"
    }

    fn description(&self) -> &str {
        "Crawls web pages and extracts their content."
    }

    async fn invoke(&self, instruction: &str, _history: &[Message]) -> EchelonResult<Vec<Message>> {
        info!(worker = self.name(), "Crawling pages");
        let content = format!(
            "WebCrawler result for: {instruction}. Extracted the main content of the \
             top sources into plain text."
        );
        Ok(vec![Message::from_node(self.name(), content)])
    }
}
