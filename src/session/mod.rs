//! Session module - Conversation history under a token budget
//!
//! This module provides the per-conversation state that is handed to the
//! reply generator:
//! - `Message` / `Role`: immutable, token-annotated messages
//! - `History`: arrival-ordered history with FIFO whole-message eviction
//! - `TokenCounter`: pluggable token counting for the generation backend
//!
//! # Example
//!
//! ```
//! use baitbot::session::{HeuristicTokenCounter, History, Message, Role};
//!
//! let counter = HeuristicTokenCounter;
//! let mut history = History::new(3000);
//! history.append(Message::counted(Role::User, "Hello dear", &counter));
//! history.append(Message::counted(Role::Assistant, "Who is this?", &counter));
//!
//! assert_eq!(history.len(), 2);
//! assert!(history.total_tokens() <= history.max_tokens());
//! ```

pub mod history;
pub mod tokens;
pub mod types;

pub use history::{History, DEFAULT_MAX_INPUT_TOKENS};
pub use tokens::{
    HeuristicTokenCounter, TokenCounter, MESSAGE_OVERHEAD_TOKENS, REPLY_PRIMING_TOKENS,
};
pub use types::{Message, Role};
