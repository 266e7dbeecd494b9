//! Transport trait and types for Baitbot
//!
//! This module defines the `ChatTransport` trait that chat-platform
//! integrations implement, along with supporting types. The conversation
//! core only ever talks to the platform through this trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::bus::ChatMessage;
use crate::error::Result;

/// Identity of a conversation on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    /// Stable conversation identifier
    pub id: String,
    /// Human-readable title (usually the other party's display name)
    pub title: String,
}

impl ChatInfo {
    /// Creates a new `ChatInfo`.
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }
}

/// The `ChatTransport` trait defines the capabilities the core needs from a
/// chat platform.
///
/// Transports are responsible for:
/// - Resolving configured conversations by id or title
/// - Fetching recent history for a conversation
/// - Sending and deleting messages
/// - Delivering every inbound event, including the echo of our own sends
///
/// # Example Implementation
///
/// ```ignore
/// use async_trait::async_trait;
/// use baitbot::bus::ChatMessage;
/// use baitbot::channels::{ChatInfo, ChatTransport};
/// use baitbot::error::Result;
/// use futures::stream::BoxStream;
///
/// struct MyTransport;
///
/// #[async_trait]
/// impl ChatTransport for MyTransport {
///     fn name(&self) -> &str {
///         "mine"
///     }
///
///     async fn resolve_chat(&self, chat: &str) -> Result<ChatInfo> {
///         Ok(ChatInfo::new(chat, chat))
///     }
///
///     async fn get_recent_messages(
///         &self,
///         chat_id: &str,
///         count: usize,
///         oldest_first: bool,
///     ) -> Result<Vec<ChatMessage>> {
///         Ok(Vec::new())
///     }
///
///     async fn send_message(&self, chat_id: &str, text: &str) -> Result<u64> {
///         println!("Sending to {}: {}", chat_id, text);
///         Ok(1)
///     }
///
///     async fn delete_last_message(&self, chat_id: &str) -> Result<()> {
///         Ok(())
///     }
///
///     fn message_stream(&self) -> Result<BoxStream<'static, ChatMessage>> {
///         Ok(Box::pin(futures::stream::pending()))
///     }
/// }
/// ```
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Returns the name of this transport (e.g., "memory").
    fn name(&self) -> &str;

    /// Resolves a configured conversation given either its id or its title.
    ///
    /// # Errors
    ///
    /// Returns `BaitError::Config` if no conversation matches.
    async fn resolve_chat(&self, chat: &str) -> Result<ChatInfo>;

    /// Fetches the `count` most recent messages of a conversation.
    ///
    /// Messages are ordered oldest first when `oldest_first` is true, and
    /// newest first otherwise.
    ///
    /// # Errors
    ///
    /// Returns `BaitError::Transport` if the fetch fails.
    async fn get_recent_messages(
        &self,
        chat_id: &str,
        count: usize,
        oldest_first: bool,
    ) -> Result<Vec<ChatMessage>>;

    /// Sends a text message and returns the platform id of the delivered message.
    ///
    /// # Errors
    ///
    /// Returns `BaitError::Transport` if delivery fails.
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<u64>;

    /// Deletes the most recent message in a conversation, if any.
    ///
    /// # Errors
    ///
    /// Returns `BaitError::Transport` if the deletion fails.
    async fn delete_last_message(&self, chat_id: &str) -> Result<()>;

    /// Returns the stream of inbound message events for all conversations.
    ///
    /// The stream is infinite and can be obtained only once.
    ///
    /// # Errors
    ///
    /// Returns `BaitError::Transport` if the stream was already taken.
    fn message_stream(&self) -> Result<BoxStream<'static, ChatMessage>>;
}
