//! Offline reply generator.
//!
//! Answers every request with a canned sentence quoting the last message in
//! the history. Lets the full pipeline run without network access.

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::session::{HeuristicTokenCounter, Message, TokenCounter};

use super::ReplyGenerator;

/// Generator that echoes the last history entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoGenerator;

impl EchoGenerator {
    /// Create a new echo generator.
    pub fn new() -> Self {
        Self
    }
}

impl TokenCounter for EchoGenerator {
    fn count_tokens(&self, text: &str) -> usize {
        HeuristicTokenCounter.count_tokens(text)
    }
}

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(&self, _preamble: &Message, history: &[Message]) -> Result<String> {
        let last = history.last().map(|m| m.content.as_str()).unwrap_or("");
        debug!(history_len = history.len(), "Echo generator reply");
        Ok(format!("This is a sample reply to the message {}.", last))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
