//! Per-conversation reply scheduling.
//!
//! A [`ConversationAgent`] owns one conversation's history and preamble and
//! decides when to reply. Inbound messages reset a debounce window; once the
//! conversation has been quiet for `response_wait`, a single reply is
//! generated from `[preamble] + history` and sent to the platform. If nothing
//! arrives for `max_silence` (plus random jitter), a reply is generated
//! anyway to keep the conversation going.
//!
//! ```text
//!   receive(msg) ──> history.append ──> wake ──┐
//!   receive(None) ─────────────────────> wake ─┤
//!   silence timeout ───────────────────────────┤
//!                                              ▼
//!                         cancel + await pending reply task
//!                                              │
//!                                              ▼
//!            sleep(response_wait) ─> generate ─> transport.send_message
//! ```
//!
//! Sent replies are never appended directly. The platform echoes them back
//! through the inbound stream and they enter the history as own messages,
//! which never trigger a reply.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use rand::Rng;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::bus::ChatMessage;
use crate::channels::{ChatInfo, ChatTransport};
use crate::config::AgentConfig;
use crate::error::{BaitError, GenerationError, Result};
use crate::providers::ReplyGenerator;
use crate::session::{History, Message, Role};

use super::preamble::default_preamble;

/// Timing and budget policy for a conversation agent.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Quiet period after the last trigger before a reply is generated
    pub response_wait: Duration,
    /// Silence after which a reply is generated without new input
    pub max_silence: Duration,
    /// Upper bound of the random delay added to `max_silence`
    pub silence_jitter: Duration,
    /// How many recent platform messages to load on start
    pub history_fetch_limit: usize,
    /// Input token ceiling of the generation backend
    pub max_input_tokens: usize,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for AgentSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            response_wait: Duration::from_secs(config.response_wait_secs),
            max_silence: Duration::from_secs(config.max_silence_secs),
            silence_jitter: Duration::from_secs(config.silence_jitter_secs),
            history_fetch_limit: config.history_fetch_limit,
            max_input_tokens: config.max_input_tokens,
        }
    }
}

impl AgentSettings {
    /// Draws the next silence timeout: `max_silence` plus a jitter in
    /// `[0, silence_jitter)`.
    pub fn silence_timeout(&self) -> Duration {
        let jitter_ms = u64::try_from(self.silence_jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.max_silence + Duration::from_millis(extra)
    }
}

struct ConversationState {
    history: History,
    preamble: Message,
    last_message_at: Option<DateTime<Utc>>,
}

struct AgentCore {
    chat: ChatInfo,
    own_id: String,
    configured_preamble: Option<String>,
    transport: Arc<dyn ChatTransport>,
    generator: Arc<dyn ReplyGenerator>,
    settings: AgentSettings,
    state: Mutex<ConversationState>,
    running: AtomicBool,
    wake: Notify,
    next_reply_id: AtomicU64,
}

/// Owns one conversation and schedules its replies.
pub struct ConversationAgent {
    core: Arc<AgentCore>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl ConversationAgent {
    /// Creates a stopped agent for `chat`.
    ///
    /// `preamble` overrides the default persona for this conversation.
    pub fn new(
        chat: ChatInfo,
        own_id: &str,
        preamble: Option<String>,
        transport: Arc<dyn ChatTransport>,
        generator: Arc<dyn ReplyGenerator>,
        settings: AgentSettings,
    ) -> Self {
        let preamble_text = preamble
            .clone()
            .unwrap_or_else(|| default_preamble(Some(&chat.title)));
        let preamble_message = Message::counted(Role::System, &preamble_text, &*generator);
        let mut history = History::new(settings.max_input_tokens);
        history.set_preamble_tokens(preamble_message.tokens);

        let core = AgentCore {
            chat,
            own_id: own_id.to_string(),
            configured_preamble: preamble,
            transport,
            generator,
            settings,
            state: Mutex::new(ConversationState {
                history,
                preamble: preamble_message,
                last_message_at: None,
            }),
            running: AtomicBool::new(false),
            wake: Notify::new(),
            next_reply_id: AtomicU64::new(1),
        };

        Self {
            core: Arc::new(core),
            loop_handle: Mutex::new(None),
        }
    }

    /// The conversation this agent owns.
    pub fn chat(&self) -> &ChatInfo {
        &self.core.chat
    }

    /// Whether the scheduling loop is running.
    pub fn is_running(&self) -> bool {
        self.core.running.load(Ordering::SeqCst)
    }

    /// Loads recent history from the platform and starts the scheduling loop.
    ///
    /// The history is cleared first and the preamble is reset to the
    /// configured (or default) one, so a stop/start cycle never duplicates
    /// entries.
    ///
    /// # Errors
    /// Returns `BaitError::Config` if the conversation id is empty or the
    /// agent is already running, and `BaitError::Transport` if the history
    /// fetch fails.
    pub async fn start(&self) -> Result<()> {
        if self.core.chat.id.is_empty() {
            return Err(BaitError::Config("Conversation id is empty".into()));
        }

        let mut slot = self.loop_handle.lock().await;
        if self.core.running.load(Ordering::SeqCst) {
            return Err(BaitError::Config(format!(
                "Agent for chat {} already running",
                self.core.chat.id
            )));
        }

        self.core.reload().await?;

        // Drop a wakeup left over from before the last stop.
        let _ = self.core.wake.notified().now_or_never();

        self.core.running.store(true, Ordering::SeqCst);
        let core = Arc::clone(&self.core);
        *slot = Some(tokio::spawn(run_loop(core)));

        info!(
            chat_id = %self.core.chat.id,
            title = %self.core.chat.title,
            "Conversation agent started"
        );
        Ok(())
    }

    /// Stops the scheduling loop and waits for it to exit.
    ///
    /// A pending reply is canceled and awaited. Stopping a stopped agent is
    /// a no-op.
    pub async fn stop(&self) {
        let mut slot = self.loop_handle.lock().await;
        if !self.core.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.core.wake.notify_one();
        if let Some(handle) = slot.take() {
            if let Err(e) = handle.await {
                error!(chat_id = %self.core.chat.id, error = %e, "Scheduling loop panicked");
            }
        }
        info!(chat_id = %self.core.chat.id, "Conversation agent stopped");
    }

    /// Feeds an inbound event to the agent.
    ///
    /// `Some(msg)` appends the message to the history; messages from our own
    /// account end there. Messages from the other party also wake the
    /// scheduler. `None` only wakes the scheduler ("generate now"). A stopped
    /// agent ignores every input.
    pub async fn receive(&self, msg: Option<&ChatMessage>) {
        if !self.is_running() {
            debug!(chat_id = %self.core.chat.id, "Agent stopped, ignoring input");
            return;
        }

        if let Some(msg) = msg {
            let own = msg.is_from(&self.core.own_id);
            {
                let mut state = self.core.state.lock().await;
                if msg.has_text() {
                    let message = self.core.to_history_message(msg);
                    debug!(
                        chat_id = %self.core.chat.id,
                        role = %message.role,
                        tokens = message.tokens,
                        "Appending message to history"
                    );
                    state.history.append(message);
                }
                if own {
                    return;
                }
                state.last_message_at = Some(Utc::now());
            }
        }

        self.core.wake.notify_one();
    }

    /// Requests a reply without new input.
    pub async fn generate_now(&self) {
        self.receive(None).await;
    }

    /// The current preamble text.
    pub async fn preamble(&self) -> String {
        self.core.state.lock().await.preamble.content.clone()
    }

    /// Replaces the preamble. Takes effect on the next generation.
    pub async fn set_preamble(&self, text: &str) {
        let message = Message::counted(Role::System, text, &*self.core.generator);
        let mut state = self.core.state.lock().await;
        debug!(
            chat_id = %self.core.chat.id,
            tokens = message.tokens,
            "Setting preamble"
        );
        state.history.set_preamble_tokens(message.tokens);
        state.preamble = message;
    }

    /// The last `n` history entries (or all) formatted as `"<role>: <text>"`.
    pub async fn history_lines(&self, n: Option<usize>) -> Vec<String> {
        self.core.state.lock().await.history.lines(n)
    }

    /// Number of messages currently in the history.
    pub async fn history_len(&self) -> usize {
        self.core.state.lock().await.history.len()
    }

    /// When the other party last wrote, if they have since the last start.
    pub async fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.core.state.lock().await.last_message_at
    }

    /// Sends arbitrary text to the conversation on the operator's behalf.
    ///
    /// # Errors
    /// Propagates the transport's send failure.
    pub async fn send_text(&self, text: &str) -> Result<u64> {
        self.core.transport.send_message(&self.core.chat.id, text).await
    }

    /// Deletes the last message on the platform and removes our last reply
    /// from the history.
    ///
    /// # Errors
    /// Propagates the transport's delete failure; the history is untouched
    /// in that case.
    pub async fn retract_last_reply(&self) -> Result<()> {
        self.core
            .transport
            .delete_last_message(&self.core.chat.id)
            .await?;
        let mut state = self.core.state.lock().await;
        if let Some(removed) = state.history.remove_last_assistant() {
            debug!(chat_id = %self.core.chat.id, "Retracted reply: {}", removed.content);
        }
        Ok(())
    }
}

impl AgentCore {
    fn to_history_message(&self, msg: &ChatMessage) -> Message {
        let role = if msg.is_from(&self.own_id) {
            Role::Assistant
        } else {
            Role::User
        };
        let text = msg.text.replace('\n', " ");
        Message::counted(role, &text, &*self.generator)
    }

    async fn reload(&self) -> Result<()> {
        let recent = self
            .transport
            .get_recent_messages(&self.chat.id, self.settings.history_fetch_limit, false)
            .await?;

        let preamble_text = self
            .configured_preamble
            .clone()
            .unwrap_or_else(|| default_preamble(Some(&self.chat.title)));
        let preamble = Message::counted(Role::System, &preamble_text, &*self.generator);

        let mut state = self.state.lock().await;
        state.history.clear();
        state.history.set_preamble_tokens(preamble.tokens);
        state.preamble = preamble;
        for msg in recent.iter().rev().filter(|m| m.has_text()) {
            state.history.append(self.to_history_message(msg));
        }
        debug!(
            chat_id = %self.chat.id,
            fetched = recent.len(),
            history_len = state.history.len(),
            tokens = state.history.total_tokens(),
            "History loaded"
        );
        Ok(())
    }

    /// Body of one reply task. Returns an error only when dispatch fails.
    async fn reply(&self, token: &CancellationToken) -> Result<()> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Reply superseded during debounce");
                return Ok(());
            }
            _ = tokio::time::sleep(self.settings.response_wait) => {}
        }

        if !self.running.load(Ordering::SeqCst) {
            return Ok(());
        }

        let (preamble, history) = {
            let state = self.state.lock().await;
            let history: Vec<Message> = state.history.iter().cloned().collect();
            (state.preamble.clone(), history)
        };
        debug!(history_len = history.len(), "Requesting reply");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Reply superseded during generation");
                return Ok(());
            }
            result = self.generator.generate(&preamble, &history) => result,
        };

        let text = match result {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => {
                warn!(error = %GenerationError::Empty, "No reply this cycle");
                return Ok(());
            }
            Err(e) => {
                let (retryable, status) = match &e {
                    BaitError::Generation(g) => (g.is_retryable(), g.status_code()),
                    _ => (false, None),
                };
                warn!(
                    error = %e,
                    retryable,
                    status = ?status,
                    "Reply generation failed, no reply this cycle"
                );
                return Ok(());
            }
        };

        info!(
            tokens = self.generator.count_tokens(&text),
            "Generated reply: {}", text
        );
        self.transport.send_message(&self.chat.id, &text).await?;
        Ok(())
    }
}

async fn run_loop(core: Arc<AgentCore>) {
    let mut pending: Option<(CancellationToken, JoinHandle<()>)> = None;

    loop {
        let silence = core.settings.silence_timeout();
        let silent = tokio::select! {
            _ = core.wake.notified() => false,
            _ = tokio::time::sleep(silence) => {
                debug!(
                    chat_id = %core.chat.id,
                    silence_secs = silence.as_secs(),
                    "Silence timeout elapsed"
                );
                true
            }
        };

        if !core.running.load(Ordering::SeqCst) {
            break;
        }

        // Silence never supersedes a reply that is still on its way.
        if silent && pending.as_ref().is_some_and(|(_, handle)| !handle.is_finished()) {
            debug!(chat_id = %core.chat.id, "Reply already pending, keeping it");
            continue;
        }

        if let Some((token, handle)) = pending.take() {
            token.cancel();
            let _ = handle.await;
        }

        let token = CancellationToken::new();
        let reply_id = core.next_reply_id.fetch_add(1, Ordering::SeqCst);
        debug!(chat_id = %core.chat.id, reply_id, "Scheduling reply");
        let handle = tokio::spawn(reply_task(Arc::clone(&core), token.clone(), reply_id));
        pending = Some((token, handle));
    }

    if let Some((token, handle)) = pending.take() {
        token.cancel();
        let _ = handle.await;
    }
    debug!(chat_id = %core.chat.id, "Scheduling loop exited");
}

async fn reply_task(core: Arc<AgentCore>, token: CancellationToken, reply_id: u64) {
    let span = info_span!("reply", chat_id = %core.chat.id, reply_id);
    async move {
        if let Err(e) = core.reply(&token).await {
            error!(error = %e, "Failed to dispatch reply");
        }
    }
    .instrument(span)
    .await
}
