//! Message Bus Module
//!
//! This module provides the inbound message pipe for Baitbot. Transports
//! publish every platform event (including the echo of our own sent
//! messages) and the agent registry consumes them as a single stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌───────────────┐     ┌───────────────────┐
//! │  Transport  │────>│  MessageBus │────>│ AgentRegistry │────>│ ConversationAgent │
//! │ (platform)  │     │  (inbound)  │     │   (routing)   │     │  (per chat_id)    │
//! └─────────────┘     └─────────────┘     └───────────────┘     └───────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use baitbot::bus::{ChatMessage, MessageBus};
//! use futures::StreamExt;
//!
//! #[tokio::main]
//! async fn main() {
//!     let bus = MessageBus::new();
//!
//!     bus.publish(ChatMessage::new(1, "chat456", "user123", "Hello")).await.unwrap();
//!
//!     let mut stream = bus.take_stream().unwrap();
//!     let received = stream.next().await.unwrap();
//!     assert_eq!(received.text, "Hello");
//! }
//! ```

pub mod message;

pub use message::ChatMessage;

use crate::error::{BaitError, Result};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Default buffer size for the inbound channel
const DEFAULT_BUFFER_SIZE: usize = 100;

/// The inbound message pipe between a transport and the agent registry.
///
/// Any number of producers publish through a shared reference; the
/// receiving half can be taken exactly once as a stream, matching a platform
/// event feed that cannot be restarted.
pub struct MessageBus {
    /// Sender for inbound messages
    inbound_tx: mpsc::Sender<ChatMessage>,
    /// Receiver for inbound messages, until taken by `take_stream`
    inbound_rx: Mutex<Option<mpsc::Receiver<ChatMessage>>>,
}

impl MessageBus {
    /// Creates a new `MessageBus` with the default buffer size of 100 messages.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Creates a new `MessageBus` with a custom buffer size.
    ///
    /// # Arguments
    /// * `buffer_size` - The maximum number of messages that can be buffered
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::channel(buffer_size);
        Self {
            inbound_tx,
            inbound_rx: Mutex::new(Some(inbound_rx)),
        }
    }

    /// Publishes an inbound message, waiting for buffer space if needed.
    ///
    /// # Errors
    /// Returns `BaitError::BusClosed` if the stream has been dropped.
    pub async fn publish(&self, msg: ChatMessage) -> Result<()> {
        self.inbound_tx
            .send(msg)
            .await
            .map_err(|_| BaitError::BusClosed)
    }

    /// Takes the receiving half as an infinite stream of inbound messages.
    ///
    /// The stream ends only when every sender is dropped.
    ///
    /// # Errors
    /// Returns `BaitError::Transport` if the stream was already taken.
    pub fn take_stream(&self) -> Result<BoxStream<'static, ChatMessage>> {
        let rx = self
            .inbound_rx
            .lock()
            .map_err(|_| BaitError::Transport("inbound receiver poisoned".into()))?
            .take()
            .ok_or_else(|| BaitError::Transport("message stream already taken".into()))?;

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        })
        .boxed())
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
