//! Agent registry for Baitbot
//!
//! This module provides the `AgentRegistry`, which is responsible for:
//! - Creating and starting one `ConversationAgent` per configured chat
//! - Routing inbound platform events to the owning agent
//! - Lookup by chat id or console index for control operations
//! - Stopping every agent on shutdown

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use tokio::sync::{watch, RwLock};
use tracing::{info, trace, warn};

use crate::bus::ChatMessage;
use crate::channels::{ChatInfo, ChatTransport};
use crate::error::{BaitError, Result};
use crate::log_component;
use crate::providers::ReplyGenerator;

use super::conversation::{AgentSettings, ConversationAgent};

#[derive(Default)]
struct Inner {
    agents: HashMap<String, Arc<ConversationAgent>>,
    /// Chat ids in registration order; console indices refer to this.
    order: Vec<String>,
}

/// Routes inbound messages to per-conversation agents.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use baitbot::agent::{AgentRegistry, AgentSettings};
/// use baitbot::channels::MemoryTransport;
/// use baitbot::providers::EchoGenerator;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let transport = Arc::new(MemoryTransport::new("111"));
/// transport.add_chat("1234567", "Hannah").await;
///
/// let registry = AgentRegistry::new(
///     transport,
///     Arc::new(EchoGenerator::new()),
///     "111",
///     AgentSettings::default(),
/// );
/// let chat = registry.register("Hannah", None).await.unwrap();
/// assert_eq!(chat.id, "1234567");
/// assert_eq!(registry.len().await, 1);
/// registry.teardown().await;
/// # })
/// ```
pub struct AgentRegistry {
    inner: RwLock<Inner>,
    transport: Arc<dyn ChatTransport>,
    generator: Arc<dyn ReplyGenerator>,
    own_id: String,
    settings: AgentSettings,
    shutdown_tx: watch::Sender<bool>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        generator: Arc<dyn ReplyGenerator>,
        own_id: &str,
        settings: AgentSettings,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: RwLock::new(Inner::default()),
            transport,
            generator,
            own_id: own_id.to_string(),
            settings,
            shutdown_tx,
        }
    }

    /// Resolves `chat` (id or title), creates its agent and starts it.
    ///
    /// # Errors
    /// Returns `BaitError::Config` if the chat cannot be resolved or is
    /// already registered, and any error from the agent's start.
    pub async fn register(&self, chat: &str, preamble: Option<String>) -> Result<ChatInfo> {
        let info = self.transport.resolve_chat(chat).await?;
        if self.inner.read().await.agents.contains_key(&info.id) {
            return Err(BaitError::Config(format!(
                "Chat {} is already registered",
                info.id
            )));
        }

        let agent = Arc::new(ConversationAgent::new(
            info.clone(),
            &self.own_id,
            preamble,
            Arc::clone(&self.transport),
            Arc::clone(&self.generator),
            self.settings.clone(),
        ));
        agent.start().await?;

        let mut inner = self.inner.write().await;
        if inner.agents.contains_key(&info.id) {
            // A concurrent registration of the same chat won.
            drop(inner);
            agent.stop().await;
            return Err(BaitError::Config(format!(
                "Chat {} is already registered",
                info.id
            )));
        }
        inner.order.push(info.id.clone());
        inner.agents.insert(info.id.clone(), agent);
        log_component!(
            info,
            "registry",
            "Registered conversation",
            chat_id = info.id.as_str(),
            title = info.title.as_str()
        );
        Ok(info)
    }

    /// Looks up the agent owning `chat_id`.
    pub async fn get(&self, chat_id: &str) -> Option<Arc<ConversationAgent>> {
        self.inner.read().await.agents.get(chat_id).cloned()
    }

    /// Looks up an agent by its position in registration order.
    ///
    /// # Errors
    /// Returns `BaitError::NotFound` for an out-of-range index.
    pub async fn get_by_index(&self, index: usize) -> Result<Arc<ConversationAgent>> {
        let inner = self.inner.read().await;
        inner
            .order
            .get(index)
            .and_then(|id| inner.agents.get(id))
            .cloned()
            .ok_or_else(|| BaitError::NotFound(format!("No chat with index {}", index)))
    }

    /// Registered conversations in registration order.
    pub async fn chats(&self) -> Vec<ChatInfo> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.agents.get(id))
            .map(|agent| agent.chat().clone())
            .collect()
    }

    /// Number of registered conversations.
    pub async fn len(&self) -> usize {
        self.inner.read().await.agents.len()
    }

    /// Whether no conversation is registered.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.agents.is_empty()
    }

    /// Forwards one inbound event to its agent. Events for unknown chats are
    /// dropped.
    pub async fn route(&self, msg: &ChatMessage) {
        match self.get(&msg.chat_id).await {
            Some(agent) => agent.receive(Some(msg)).await,
            None => trace!(chat_id = %msg.chat_id, "Dropping message for unknown chat"),
        }
    }

    /// Consumes the inbound stream, routing every event until shutdown.
    ///
    /// # Errors
    /// Returns `BaitError::BusClosed` if the stream ends before shutdown.
    pub async fn run(&self, mut stream: BoxStream<'static, ChatMessage>) -> Result<()> {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow_and_update() {
            return Ok(());
        }
        info!(transport = self.transport.name(), "Routing inbound messages");

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Registry received shutdown signal");
                        return Ok(());
                    }
                }
                next = stream.next() => match next {
                    Some(msg) => self.route(&msg).await,
                    None => {
                        warn!("Inbound message stream ended");
                        return Err(BaitError::BusClosed);
                    }
                },
            }
        }
    }

    /// Signals [`AgentRegistry::run`] to return.
    pub fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Stops every agent and forgets them.
    pub async fn teardown(&self) {
        let agents: Vec<Arc<ConversationAgent>> = {
            let mut inner = self.inner.write().await;
            inner.order.clear();
            inner.agents.drain().map(|(_, agent)| agent).collect()
        };
        for agent in agents {
            agent.stop().await;
        }
        log_component!(info, "registry", "All conversation agents stopped");
    }
}
