//! Message types for the Baitbot inbound pipe
//!
//! This module defines the platform message shape shared by transports,
//! the registry and the conversation agents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as seen on the chat platform.
///
/// Both inbound events and fetched history use this shape. Messages sent by
/// our own account come back through the inbound stream as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Platform identifier of the message
    pub id: u64,
    /// The conversation this message belongs to
    pub chat_id: String,
    /// Unique identifier of the sender
    pub sender_id: String,
    /// Text content; empty for media-only messages
    pub text: String,
    /// When the platform received the message
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a new message stamped with the current time.
    ///
    /// # Example
    /// ```
    /// use baitbot::bus::ChatMessage;
    ///
    /// let msg = ChatMessage::new(7, "chat456", "user123", "Hello, dear");
    /// assert_eq!(msg.chat_id, "chat456");
    /// assert!(msg.has_text());
    /// ```
    pub fn new(id: u64, chat_id: &str, sender_id: &str, text: &str) -> Self {
        Self {
            id,
            chat_id: chat_id.to_string(),
            sender_id: sender_id.to_string(),
            text: text.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Whether the message carries any text worth adding to history.
    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    /// Whether the message was sent by the account identified by `own_id`.
    pub fn is_from(&self, own_id: &str) -> bool {
        self.sender_id == own_id
    }
}
