//! Token accounting for the generation backend.
//!
//! Costs follow the chat-completions framing: every message carries one role
//! token and four framing tokens, and every request is primed with two extra
//! tokens for the reply.

/// Role token charged for every message.
pub const ROLE_TOKENS: usize = 1;

/// Framing tokens charged for every message (`<im_start>{role}\n{content}<im_end>\n`).
pub const FRAMING_TOKENS: usize = 4;

/// Total fixed overhead per message.
pub const MESSAGE_OVERHEAD_TOKENS: usize = ROLE_TOKENS + FRAMING_TOKENS;

/// Tokens reserved once per request to prime the reply (`<im_start>assistant`).
pub const REPLY_PRIMING_TOKENS: usize = 2;

/// Counts tokens in raw text.
///
/// Implementations must be pure and deterministic for a given backend/model.
pub trait TokenCounter: Send + Sync {
    /// Number of tokens `text` occupies, without any per-message overhead.
    fn count_tokens(&self, text: &str) -> usize;
}

/// Length-based estimate of roughly four characters per token.
///
/// Good enough to keep requests under the backend's input limit when no
/// model-specific tokenizer is available.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicTokenCounter;

impl TokenCounter for HeuristicTokenCounter {
    fn count_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}
