//! OpenAI Generator Implementation
//!
//! This module implements the `ReplyGenerator` trait for OpenAI's Chat
//! Completions API (and compatible endpoints), handling message conversion
//! and response parsing.
//!
//! # Example
//!
//! ```rust,ignore
//! use baitbot::providers::{OpenAIGenerator, ReplyGenerator};
//! use baitbot::session::{Message, Role};
//!
//! async fn example() {
//!     let generator = OpenAIGenerator::new("your-api-key");
//!     let preamble = Message::with_tokens(Role::System, "Play along.", 8);
//!     let history = vec![Message::with_tokens(Role::User, "Hello dear", 8)];
//!
//!     let reply = generator.generate(&preamble, &history).await.unwrap();
//!     println!("Reply: {}", reply);
//! }
//! ```

use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GenerationError, Result};
use crate::session::{HeuristicTokenCounter, Message, TokenCounter};

use super::{parse_generation_error, GenerationOptions, ReplyGenerator};

/// The OpenAI API endpoint URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1";

// ============================================================================
// OpenAI API Request Types
// ============================================================================

/// OpenAI API request body.
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    /// Model identifier
    model: String,
    /// Conversation messages (including system)
    messages: Vec<OpenAIMessage>,
    /// Maximum tokens to generate
    max_tokens: u32,
    /// Temperature for sampling
    temperature: f32,
}

/// A message in OpenAI's format.
#[derive(Debug, Serialize)]
struct OpenAIMessage {
    /// Role: "system", "user" or "assistant"
    role: String,
    /// Message content
    content: String,
}

// ============================================================================
// OpenAI API Response Types
// ============================================================================

/// OpenAI API response body.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    /// Response choices
    choices: Vec<OpenAIChoice>,
    /// Token usage
    usage: Option<OpenAIUsage>,
}

/// A choice in the response.
#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

/// A message in the response.
#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

/// OpenAI token usage.
#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI API error response.
#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// OpenAI API error details.
#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
    r#type: String,
}

// ============================================================================
// OpenAI Generator
// ============================================================================

/// Reply generator backed by an OpenAI-compatible chat completions API.
///
/// Token counts use [`HeuristicTokenCounter`], which approximates the
/// backend's tokenizer closely enough to keep requests under the input limit.
pub struct OpenAIGenerator {
    /// API key for authentication
    api_key: String,
    /// API base URL
    api_base: String,
    /// Model and sampling options
    options: GenerationOptions,
    /// HTTP client for making requests
    client: Client,
    counter: HeuristicTokenCounter,
}

impl OpenAIGenerator {
    /// Create a new generator with the given API key and default options.
    ///
    /// # Example
    /// ```
    /// use baitbot::providers::{OpenAIGenerator, ReplyGenerator};
    ///
    /// let generator = OpenAIGenerator::new("sk-xxx");
    /// assert_eq!(generator.name(), "openai");
    /// assert_eq!(generator.model(), "gpt-3.5-turbo");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, OPENAI_API_URL)
    }

    /// Create a generator for an OpenAI-compatible API at a custom base URL.
    ///
    /// A trailing slash on `api_base` is removed.
    pub fn with_base_url(api_key: &str, api_base: &str) -> Self {
        Self::with_client(api_key, api_base, Client::new())
    }

    /// Create a generator with a custom HTTP client (timeouts, proxies).
    pub fn with_client(api_key: &str, api_base: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
            options: GenerationOptions::default(),
            client,
            counter: HeuristicTokenCounter,
        }
    }

    /// Replace the model and sampling options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &str {
        &self.options.model
    }
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert the preamble and history to OpenAI API format.
fn convert_messages(preamble: &Message, history: &[Message]) -> Vec<OpenAIMessage> {
    std::iter::once(preamble)
        .chain(history.iter())
        .map(|msg| OpenAIMessage {
            role: msg.role.to_string(),
            content: msg.content.clone(),
        })
        .collect()
}

/// Extract the reply text from an OpenAI API response.
fn extract_reply(response: OpenAIResponse) -> std::result::Result<String, GenerationError> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationError::Malformed("response has no choices".into()))?;
    match choice.message.content {
        Some(content) if !content.trim().is_empty() => Ok(content),
        _ => Err(GenerationError::Empty),
    }
}

// ============================================================================
// ReplyGenerator Implementation
// ============================================================================

impl TokenCounter for OpenAIGenerator {
    fn count_tokens(&self, text: &str) -> usize {
        self.counter.count_tokens(text)
    }
}

#[async_trait]
impl ReplyGenerator for OpenAIGenerator {
    async fn generate(&self, preamble: &Message, history: &[Message]) -> Result<String> {
        let request = OpenAIRequest {
            model: self.options.model.clone(),
            messages: convert_messages(preamble, history),
            max_tokens: self.options.max_tokens,
            temperature: self.options.temperature,
        };

        debug!(
            model = %self.options.model,
            history_len = history.len(),
            "OpenAI request"
        );
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Network(format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                return Err(parse_generation_error(
                    status,
                    &format!(
                        "{} - {}",
                        error_response.error.r#type, error_response.error.message
                    ),
                )
                .into());
            }

            return Err(parse_generation_error(status, &error_text).into());
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            GenerationError::Malformed(format!("Failed to parse OpenAI response: {}", e))
        })?;

        if let Some(usage) = &openai_response.usage {
            info!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                latency_ms = started.elapsed().as_millis() as u64,
                "OpenAI response received"
            );
        } else {
            info!(
                latency_ms = started.elapsed().as_millis() as u64,
                "OpenAI response received"
            );
        }

        Ok(extract_reply(openai_response)?)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// Tests
// ============================================================================
