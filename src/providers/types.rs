//! Provider types for Baitbot
//!
//! This module defines the `ReplyGenerator` trait and the sampling options
//! shared by generation backends.

use async_trait::async_trait;

use crate::error::Result;
use crate::session::{Message, TokenCounter};

/// Trait for reply-generation backends (OpenAI-compatible APIs, fakes, etc.).
///
/// A generator turns `[preamble] + history` into the next reply text. It also
/// counts tokens the way its backend does, so the conversation history can
/// be bounded in the backend's own units.
#[async_trait]
pub trait ReplyGenerator: TokenCounter {
    /// Generate the next reply for a conversation.
    ///
    /// # Arguments
    /// * `preamble` - The system message prefixed to every request
    /// * `history` - Conversation history, oldest first
    ///
    /// # Errors
    /// Returns `BaitError::Generation` on backend failure (rate limit,
    /// network, malformed response).
    async fn generate(&self, preamble: &Message, history: &[Message]) -> Result<String>;

    /// Get the generator name (e.g., "openai", "echo").
    fn name(&self) -> &str;
}

/// Sampling options for generation requests.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Model identifier
    pub model: String,
    /// Maximum number of tokens to generate
    pub max_tokens: u32,
    /// Temperature for sampling
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 256,
            temperature: 0.5,
        }
    }
}

impl GenerationOptions {
    /// Create default options.
    ///
    /// # Example
    /// ```
    /// use baitbot::providers::GenerationOptions;
    ///
    /// let options = GenerationOptions::new().with_model("gpt-4o-mini").with_max_tokens(128);
    /// assert_eq!(options.model, "gpt-4o-mini");
    /// assert_eq!(options.max_tokens, 128);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the model identifier.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_options_default() {
        let options = GenerationOptions::default();
        assert_eq!(options.model, "gpt-3.5-turbo");
        assert_eq!(options.max_tokens, 256);
        assert!((options.temperature - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_generation_options_builder() {
        let options = GenerationOptions::new().with_temperature(0.9);
        assert!((options.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(options.max_tokens, 256);
    }
}
