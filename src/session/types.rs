//! Session types for Baitbot
//!
//! This module defines the core conversation types: messages annotated with
//! their token cost, and the roles they are attributed to.

use serde::{Deserialize, Serialize};

use super::tokens::{TokenCounter, MESSAGE_OVERHEAD_TOKENS};

/// A single message in a conversation.
///
/// Messages are immutable once created. The token cost is computed at
/// construction time from the text plus a fixed per-message overhead, so
/// the history never has to re-count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who the message is attributed to
    pub role: Role,
    /// The text content of the message
    pub content: String,
    /// Token cost including role/framing overhead
    pub tokens: usize,
}

impl Message {
    /// Create a message whose token cost is measured with `counter`.
    ///
    /// The cost is `counter.count_tokens(content)` plus
    /// [`MESSAGE_OVERHEAD_TOKENS`].
    ///
    /// # Example
    /// ```
    /// use baitbot::session::{HeuristicTokenCounter, Message, Role};
    ///
    /// let msg = Message::counted(Role::User, "hello there!", &HeuristicTokenCounter);
    /// assert_eq!(msg.role, Role::User);
    /// assert_eq!(msg.tokens, 3 + 5);
    /// ```
    pub fn counted<C: TokenCounter + ?Sized>(role: Role, content: &str, counter: &C) -> Self {
        Self {
            role,
            content: content.to_string(),
            tokens: counter.count_tokens(content) + MESSAGE_OVERHEAD_TOKENS,
        }
    }

    /// Create a message with an explicit, already computed token cost.
    pub fn with_tokens(role: Role, content: &str, tokens: usize) -> Self {
        Self {
            role,
            content: content.to_string(),
            tokens,
        }
    }

    /// Whether this message was authored by our own account.
    pub fn is_own(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Render the message as `"<role>: <text>"` for inspection.
    pub fn line(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

/// The role of a message in a conversation.
///
/// `Assistant` marks messages sent by our own account (the reply side),
/// `User` marks messages from the other party, and `System` is reserved for
/// the preamble.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The preamble prefixed to every generation request
    System,
    /// Messages from the other party
    User,
    /// Messages from our own account
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}
