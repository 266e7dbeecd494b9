//! In-memory chat transport.
//!
//! Keeps a per-conversation message log and behaves like a real platform in
//! the one way the core depends on: every message we send is echoed back
//! through the inbound stream. Used by the `--demo` mode and by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::bus::{ChatMessage, MessageBus};
use crate::error::{BaitError, Result};

use super::types::{ChatInfo, ChatTransport};

/// First message id handed out by the transport.
const FIRST_MESSAGE_ID: u64 = 100;

struct ChatLog {
    title: String,
    messages: Vec<ChatMessage>,
}

/// A chat platform simulated in memory.
pub struct MemoryTransport {
    own_id: String,
    chats: RwLock<HashMap<String, ChatLog>>,
    bus: MessageBus,
    next_id: AtomicU64,
}

impl MemoryTransport {
    /// Creates an empty transport for the account identified by `own_id`.
    ///
    /// # Example
    /// ```
    /// use baitbot::channels::{ChatTransport, MemoryTransport};
    ///
    /// let transport = MemoryTransport::new("111");
    /// assert_eq!(transport.name(), "memory");
    /// ```
    pub fn new(own_id: &str) -> Self {
        Self {
            own_id: own_id.to_string(),
            chats: RwLock::new(HashMap::new()),
            bus: MessageBus::new(),
            next_id: AtomicU64::new(FIRST_MESSAGE_ID),
        }
    }

    /// The sender id used for messages we send.
    pub fn own_id(&self) -> &str {
        &self.own_id
    }

    /// Adds a conversation. Re-adding an existing id only updates its title.
    pub async fn add_chat(&self, chat_id: &str, title: &str) {
        let mut chats = self.chats.write().await;
        chats
            .entry(chat_id.to_string())
            .and_modify(|log| log.title = title.to_string())
            .or_insert_with(|| ChatLog {
                title: title.to_string(),
                messages: Vec::new(),
            });
    }

    /// Appends a message to a conversation's log without publishing it.
    ///
    /// Models history that existed before the process started.
    ///
    /// # Errors
    /// Returns `BaitError::Transport` if the conversation is unknown.
    pub async fn seed(&self, chat_id: &str, sender_id: &str, text: &str) -> Result<ChatMessage> {
        let msg = ChatMessage::new(self.allocate_id(), chat_id, sender_id, text);
        self.append(msg.clone()).await?;
        Ok(msg)
    }

    /// Records a message from `sender_id` and publishes it as an inbound event.
    ///
    /// # Errors
    /// Returns `BaitError::Transport` if the conversation is unknown, or
    /// `BaitError::BusClosed` if the inbound stream was dropped.
    pub async fn inject(&self, chat_id: &str, sender_id: &str, text: &str) -> Result<ChatMessage> {
        let msg = self.seed(chat_id, sender_id, text).await?;
        self.bus.publish(msg.clone()).await?;
        Ok(msg)
    }

    /// Snapshot of a conversation's log, oldest first.
    pub async fn messages(&self, chat_id: &str) -> Vec<ChatMessage> {
        let chats = self.chats.read().await;
        chats
            .get(chat_id)
            .map(|log| log.messages.clone())
            .unwrap_or_default()
    }

    /// Texts of the messages we sent to a conversation, oldest first.
    pub async fn sent_texts(&self, chat_id: &str) -> Vec<String> {
        self.messages(chat_id)
            .await
            .into_iter()
            .filter(|m| m.is_from(&self.own_id))
            .map(|m| m.text)
            .collect()
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn append(&self, msg: ChatMessage) -> Result<()> {
        let mut chats = self.chats.write().await;
        let log = chats
            .get_mut(&msg.chat_id)
            .ok_or_else(|| BaitError::Transport(format!("Unknown chat {}", msg.chat_id)))?;
        log.messages.push(msg);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn resolve_chat(&self, chat: &str) -> Result<ChatInfo> {
        let chats = self.chats.read().await;
        if let Some(log) = chats.get(chat) {
            return Ok(ChatInfo::new(chat, &log.title));
        }
        chats
            .iter()
            .find(|(_, log)| log.title == chat)
            .map(|(id, log)| ChatInfo::new(id, &log.title))
            .ok_or_else(|| BaitError::Config(format!("Chat not found with id or title {}", chat)))
    }

    async fn get_recent_messages(
        &self,
        chat_id: &str,
        count: usize,
        oldest_first: bool,
    ) -> Result<Vec<ChatMessage>> {
        let chats = self.chats.read().await;
        let log = chats
            .get(chat_id)
            .ok_or_else(|| BaitError::Transport(format!("Unknown chat {}", chat_id)))?;
        let skip = log.messages.len().saturating_sub(count);
        let mut recent: Vec<ChatMessage> = log.messages[skip..].to_vec();
        if !oldest_first {
            recent.reverse();
        }
        Ok(recent)
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<u64> {
        info!(chat_id = %chat_id, "Sending message: {}", text);
        let msg = ChatMessage::new(self.allocate_id(), chat_id, &self.own_id, text);
        self.append(msg.clone()).await?;
        let id = msg.id;
        // The platform echoes our own messages back; history is updated from the echo.
        if let Err(e) = self.bus.publish(msg).await {
            warn!(chat_id = %chat_id, error = %e, "Failed to echo sent message");
        }
        Ok(id)
    }

    async fn delete_last_message(&self, chat_id: &str) -> Result<()> {
        let mut chats = self.chats.write().await;
        let log = chats
            .get_mut(chat_id)
            .ok_or_else(|| BaitError::Transport(format!("Unknown chat {}", chat_id)))?;
        match log.messages.pop() {
            Some(msg) => info!(chat_id = %chat_id, id = msg.id, "Deleted message: {}", msg.text),
            None => debug!(chat_id = %chat_id, "No message to delete"),
        }
        Ok(())
    }

    fn message_stream(&self) -> Result<BoxStream<'static, ChatMessage>> {
        self.bus.take_stream()
    }
}
