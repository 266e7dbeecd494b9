//! Providers module - Reply generation backends
//!
//! This module defines the `ReplyGenerator` trait and its implementations.
//! A generator receives the preamble and the bounded history of one
//! conversation and returns the next reply text; it also counts tokens so the
//! history can be kept within the backend's input limit.
//!
//! # Example
//!
//! ```
//! use baitbot::providers::{EchoGenerator, ReplyGenerator};
//! use baitbot::session::{Message, Role};
//!
//! #[tokio::main]
//! async fn main() {
//!     let generator = EchoGenerator::new();
//!     let preamble = Message::with_tokens(Role::System, "Play along.", 8);
//!     let history = vec![Message::with_tokens(Role::User, "hello", 7)];
//!
//!     let reply = generator.generate(&preamble, &history).await.unwrap();
//!     assert_eq!(reply, "This is a sample reply to the message hello.");
//! }
//! ```

pub mod echo;
pub mod openai;
mod types;

use crate::error::GenerationError;

pub use crate::session::{HeuristicTokenCounter, TokenCounter};
pub use echo::EchoGenerator;
pub use openai::OpenAIGenerator;
pub use types::{GenerationOptions, ReplyGenerator};

/// Parse an HTTP status code and response body into a classified [`GenerationError`].
///
/// Keeps the status mapping in one place so every HTTP-backed generator
/// reports failures the same way.
pub fn parse_generation_error(status: u16, body: &str) -> GenerationError {
    match status {
        401 | 403 => GenerationError::Auth(body.to_string()),
        429 => GenerationError::RateLimit(body.to_string()),
        500..=599 => GenerationError::Server(body.to_string()),
        _ => GenerationError::Unknown(format!("HTTP {}: {}", status, body)),
    }
}
