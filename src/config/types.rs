//! Configuration type definitions for Baitbot
//!
//! This module defines all configuration structs used throughout the crate.
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration struct for Baitbot
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Sender id of our own account on the chat platform
    pub own_id: String,
    /// Conversations to take part in
    pub chats: Vec<ChatConfig>,
    /// Reply scheduling and history policy
    pub agent: AgentConfig,
    /// Generation backend configuration
    pub provider: ProviderConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

// ============================================================================
// Chat Configuration
// ============================================================================

/// A conversation to take part in.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    /// Conversation id or title
    pub chat: String,
    /// Persona preamble for this conversation; the default persona if unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preamble: Option<String>,
}

// ============================================================================
// Agent Configuration
// ============================================================================

/// Reply scheduling and history policy, shared by all conversations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Quiet period (seconds) after the last message before replying
    pub response_wait_secs: u64,
    /// Silence (seconds) after which a reply is generated unprompted
    pub max_silence_secs: u64,
    /// Upper bound (seconds) of the random delay added to the silence timeout
    pub silence_jitter_secs: u64,
    /// Number of recent messages loaded when an agent starts
    pub history_fetch_limit: usize,
    /// Input token ceiling of the generation backend
    pub max_input_tokens: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            response_wait_secs: 10,
            max_silence_secs: 4 * 60 * 60,
            silence_jitter_secs: 60 * 60,
            history_fetch_limit: 1000,
            max_input_tokens: crate::session::DEFAULT_MAX_INPUT_TOKENS,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API key for authentication; replies are canned when unset
    pub api_key: Option<String>,
    /// Custom API base URL for OpenAI-compatible endpoints
    pub api_base: Option<String>,
    /// Model identifier
    pub model: String,
    /// Maximum tokens per reply
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 256,
            temperature: 0.5,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Compact single-line output with a `component` field
    #[default]
    Component,
    /// JSON lines
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Append logs to this file instead of stderr
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            file: None,
        }
    }
}
