//! Integration tests for Baitbot
//!
//! These tests drive the full inbound path end to end: the in-memory
//! transport publishes events, the registry routes them to conversation
//! agents, and replies travel back through the transport's echo. Time is
//! paused so debounce and silence timers run deterministically.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::task::JoinHandle;

use baitbot::{
    agent::{AgentRegistry, AgentSettings},
    bus::ChatMessage,
    channels::{ChatInfo, ChatTransport, MemoryTransport},
    control::{ControlCommand, Controller},
    error::{BaitError, GenerationError, Result},
    providers::ReplyGenerator,
    session::{HeuristicTokenCounter, Message, Role, TokenCounter},
};

const OWN: &str = "111";
const OTHER: &str = "222";
const CHAT: &str = "1234567";

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Clone)]
struct Call {
    preamble: Message,
    history: Vec<Message>,
}

impl Call {
    fn contents(&self) -> Vec<&str> {
        self.history.iter().map(|m| m.content.as_str()).collect()
    }
}

/// Records every generation request and answers with a fixed reply.
struct RecordingGenerator {
    calls: Mutex<Vec<Call>>,
    reply: String,
    fail_first: Mutex<usize>,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reply: reply.to_string(),
            fail_first: Mutex::new(0),
        }
    }

    fn failing_first(reply: &str, n: usize) -> Self {
        let generator = Self::new(reply);
        *generator.fail_first.lock().unwrap() = n;
        generator
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl TokenCounter for RecordingGenerator {
    fn count_tokens(&self, text: &str) -> usize {
        HeuristicTokenCounter.count_tokens(text)
    }
}

#[async_trait]
impl ReplyGenerator for RecordingGenerator {
    async fn generate(&self, preamble: &Message, history: &[Message]) -> Result<String> {
        self.calls.lock().unwrap().push(Call {
            preamble: preamble.clone(),
            history: history.to_vec(),
        });
        let mut fail_first = self.fail_first.lock().unwrap();
        if *fail_first > 0 {
            *fail_first -= 1;
            return Err(GenerationError::Network("connection reset".into()).into());
        }
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Delegates to a memory transport but fails the first `n` sends.
struct FlakyTransport {
    inner: MemoryTransport,
    failures_left: Mutex<usize>,
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn resolve_chat(&self, chat: &str) -> Result<ChatInfo> {
        self.inner.resolve_chat(chat).await
    }

    async fn get_recent_messages(
        &self,
        chat_id: &str,
        count: usize,
        oldest_first: bool,
    ) -> Result<Vec<ChatMessage>> {
        self.inner
            .get_recent_messages(chat_id, count, oldest_first)
            .await
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<u64> {
        {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(BaitError::Transport("platform unavailable".into()));
            }
        }
        self.inner.send_message(chat_id, text).await
    }

    async fn delete_last_message(&self, chat_id: &str) -> Result<()> {
        self.inner.delete_last_message(chat_id).await
    }

    fn message_stream(&self) -> Result<BoxStream<'static, ChatMessage>> {
        self.inner.message_stream()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn settings() -> AgentSettings {
    AgentSettings {
        response_wait: Duration::from_secs(10),
        max_silence: Duration::from_secs(3600),
        silence_jitter: Duration::ZERO,
        history_fetch_limit: 1000,
        max_input_tokens: 3000,
    }
}

async fn memory_transport() -> Arc<MemoryTransport> {
    let transport = Arc::new(MemoryTransport::new(OWN));
    transport.add_chat(CHAT, "Hannah").await;
    transport
}

fn spawn_router(
    registry: &Arc<AgentRegistry>,
    transport: &dyn ChatTransport,
) -> JoinHandle<Result<()>> {
    let stream = transport.message_stream().unwrap();
    let registry = Arc::clone(registry);
    tokio::spawn(async move { registry.run(stream).await })
}

async fn shutdown(registry: Arc<AgentRegistry>, router: JoinHandle<Result<()>>) {
    registry.shutdown();
    router.await.unwrap().unwrap();
    registry.teardown().await;
}

// ============================================================================
// End-to-end scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_loaded_history_and_new_message_produce_one_reply() {
    let transport = memory_transport().await;
    transport.seed(CHAT, OTHER, "m1").await.unwrap();
    transport.seed(CHAT, OWN, "m2").await.unwrap();
    transport.seed(CHAT, OTHER, "m3").await.unwrap();

    let generator = Arc::new(RecordingGenerator::new("Who is this?"));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, Some("Play along.".into())).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    transport.inject(CHAT, OTHER, "hello").await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].preamble.role, Role::System);
    assert_eq!(calls[0].preamble.content, "Play along.");
    assert_eq!(calls[0].contents(), vec!["m1", "m2", "m3", "hello"]);
    assert_eq!(calls[0].history[1].role, Role::Assistant);
    assert_eq!(transport.sent_texts(CHAT).await, vec!["m2", "Who is this?"]);

    // The echoed reply lands in history and does not trigger another reply
    tokio::time::sleep(Duration::from_secs(30)).await;
    let agent = registry.get(CHAT).await.unwrap();
    assert_eq!(
        agent.history_lines(Some(1)).await,
        vec!["assistant: Who is this?"]
    );
    assert_eq!(generator.calls().len(), 1);

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_burst_of_messages_is_answered_once() {
    let transport = memory_transport().await;
    let generator = Arc::new(RecordingGenerator::new("Oh my"));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register("Hannah", None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    for text in ["hi", "are you there", "I have an offer"] {
        transport.inject(CHAT, OTHER, text).await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    tokio::time::sleep(Duration::from_secs(15)).await;

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].contents(),
        vec!["hi", "are you there", "I have an offer"]
    );
    assert_eq!(transport.sent_texts(CHAT).await, vec!["Oh my"]);

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_silence_produces_exactly_one_reply() {
    let transport = memory_transport().await;
    transport.seed(CHAT, OTHER, "old").await.unwrap();
    let generator = Arc::new(RecordingGenerator::new("Still there?"));
    let mut settings = settings();
    settings.max_silence = Duration::from_secs(600);
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings,
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    tokio::time::sleep(Duration::from_secs(620)).await;

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].contents(), vec!["old"]);
    assert!(calls[0].preamble.content.contains("named Hannah"));

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_messages_for_unknown_chats_are_ignored() {
    let transport = memory_transport().await;
    transport.add_chat("999", "Stranger").await;
    let generator = Arc::new(RecordingGenerator::new("ok"));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    transport.inject("999", OTHER, "hello?").await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(generator.calls().is_empty());
    assert!(transport.sent_texts("999").await.is_empty());

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_generation_failure_retries_on_next_trigger() {
    let transport = memory_transport().await;
    let generator = Arc::new(RecordingGenerator::failing_first("Sorry, I was away", 1));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    transport.inject(CHAT, OTHER, "first").await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(generator.calls().len(), 1);
    assert!(transport.sent_texts(CHAT).await.is_empty());

    transport.inject(CHAT, OTHER, "second").await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    let calls = generator.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].contents(), vec!["first", "second"]);
    assert_eq!(
        transport.sent_texts(CHAT).await,
        vec!["Sorry, I was away"]
    );

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_dispatch_failure_keeps_agent_alive() {
    let flaky = Arc::new(FlakyTransport {
        inner: MemoryTransport::new(OWN),
        failures_left: Mutex::new(1),
    });
    flaky.inner.add_chat(CHAT, "Hannah").await;
    let generator = Arc::new(RecordingGenerator::new("reply"));
    let registry = Arc::new(AgentRegistry::new(
        flaky.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, flaky.as_ref());

    flaky.inner.inject(CHAT, OTHER, "one").await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert!(flaky.inner.sent_texts(CHAT).await.is_empty());

    flaky.inner.inject(CHAT, OTHER, "two").await.unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(generator.calls().len(), 2);
    assert_eq!(flaky.inner.sent_texts(CHAT).await, vec!["reply"]);
    assert!(registry.get(CHAT).await.unwrap().is_running());

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_pause_drops_pending_reply_and_resume_reloads() {
    let transport = memory_transport().await;
    let generator = Arc::new(RecordingGenerator::new("ok"));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());
    let controller = Controller::new(Arc::clone(&registry));

    transport.inject(CHAT, OTHER, "hello").await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    controller
        .execute(ControlCommand::Pause { index: 0 })
        .await
        .unwrap();

    // Input while paused is ignored by the agent
    transport.inject(CHAT, OTHER, "anyone?").await.unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert!(generator.calls().is_empty());

    // Resuming reloads both messages from the platform, without duplicates
    controller
        .execute(ControlCommand::Continue { index: 0 })
        .await
        .unwrap();
    let history = controller
        .execute(ControlCommand::History { index: 0, n: None })
        .await
        .unwrap();
    assert_eq!(history, "user: hello\nuser: anyone?");

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_delete_retracts_last_reply() {
    let transport = memory_transport().await;
    let generator = Arc::new(RecordingGenerator::new("Tell me more"));
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings(),
    ));
    registry.register(CHAT, None).await.unwrap();
    let router = spawn_router(&registry, transport.as_ref());
    let controller = Controller::new(Arc::clone(&registry));

    transport.inject(CHAT, OTHER, "Invest now").await.unwrap();
    tokio::time::sleep(Duration::from_secs(12)).await;
    assert_eq!(transport.sent_texts(CHAT).await, vec!["Tell me more"]);

    controller
        .execute(ControlCommand::Delete { index: 0 })
        .await
        .unwrap();
    assert!(transport.sent_texts(CHAT).await.is_empty());
    let history = controller
        .execute(ControlCommand::History { index: 0, n: None })
        .await
        .unwrap();
    assert_eq!(history, "user: Invest now");

    // Regenerate on demand
    controller
        .execute(ControlCommand::Generate { index: 0 })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(generator.calls().len(), 2);
    assert_eq!(transport.sent_texts(CHAT).await, vec!["Tell me more"]);

    shutdown(registry, router).await;
}

#[tokio::test(start_paused = true)]
async fn test_history_stays_within_budget() {
    let transport = memory_transport().await;
    let generator = Arc::new(RecordingGenerator::new("ok"));
    let mut settings = settings();
    settings.max_input_tokens = 200;
    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        generator.clone(),
        OWN,
        settings,
    ));
    registry
        .register(CHAT, Some("Short preamble".into()))
        .await
        .unwrap();
    let router = spawn_router(&registry, transport.as_ref());

    for i in 0..40 {
        transport
            .inject(CHAT, OTHER, &format!("message number {} with some padding", i))
            .await
            .unwrap();
    }
    tokio::time::sleep(Duration::from_secs(11)).await;

    let calls = generator.calls();
    assert_eq!(calls.len(), 1);
    let total: usize = calls[0].preamble.tokens
        + calls[0].history.iter().map(|m| m.tokens).sum::<usize>()
        + baitbot::session::REPLY_PRIMING_TOKENS;
    assert!(total <= 200);
    assert!(calls[0].history.len() < 40);
    assert_eq!(
        calls[0].history.last().unwrap().content,
        "message number 39 with some padding"
    );

    shutdown(registry, router).await;
}
