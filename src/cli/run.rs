//! Run command handler: wires transport, generator, registry and console.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use baitbot::agent::{AgentRegistry, AgentSettings};
use baitbot::channels::{ChatTransport, InboundSimulator, MemoryTransport};
use baitbot::config::{ChatConfig, Config, ProviderConfig};
use baitbot::control::Controller;
use baitbot::providers::{EchoGenerator, GenerationOptions, OpenAIGenerator, ReplyGenerator};
use baitbot::utils::logging::init_logging;

use super::console::run_console;

const DEMO_OWN_ID: &str = "111";
const DEMO_CHAT_ID: &str = "1234567";
const DEMO_CHAT_TITLE: &str = "Hannah";
const DEMO_INTERVAL: Duration = Duration::from_secs(5);

fn build_generator(provider: &ProviderConfig) -> Arc<dyn ReplyGenerator> {
    match provider.api_key.as_deref().filter(|k| !k.is_empty()) {
        Some(api_key) => {
            let options = GenerationOptions::new()
                .with_model(&provider.model)
                .with_max_tokens(provider.max_tokens)
                .with_temperature(provider.temperature);
            let generator = match provider.api_base.as_deref() {
                Some(base) => OpenAIGenerator::with_base_url(api_key, base),
                None => OpenAIGenerator::new(api_key),
            };
            Arc::new(generator.with_options(options))
        }
        None => {
            warn!("No provider API key configured, using canned echo replies");
            Arc::new(EchoGenerator::new())
        }
    }
}

/// Start agents for every configured chat and hand control to the console.
pub(crate) async fn cmd_run(path: impl AsRef<Path>, demo: bool) -> Result<()> {
    let path = path.as_ref();
    let mut config = Config::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;
    init_logging(&config.logging).context("Failed to initialize logging")?;

    if demo {
        if config.own_id.is_empty() {
            config.own_id = DEMO_OWN_ID.to_string();
        }
        if config.chats.is_empty() {
            config.chats.push(ChatConfig {
                chat: DEMO_CHAT_TITLE.to_string(),
                preamble: None,
            });
        }
    }
    config.validate()?;
    if config.chats.is_empty() {
        bail!("No chats configured; add entries to `chats` or pass --demo");
    }

    let transport = Arc::new(MemoryTransport::new(&config.own_id));
    for chat in &config.chats {
        if demo && chat.chat == DEMO_CHAT_TITLE {
            transport.add_chat(DEMO_CHAT_ID, DEMO_CHAT_TITLE).await;
        } else {
            transport.add_chat(&chat.chat, &chat.chat).await;
        }
    }
    let stream = transport.message_stream()?;

    let registry = Arc::new(AgentRegistry::new(
        transport.clone(),
        build_generator(&config.provider),
        &config.own_id,
        AgentSettings::from(&config.agent),
    ));
    for chat in &config.chats {
        registry
            .register(&chat.chat, chat.preamble.clone())
            .await
            .with_context(|| format!("Failed to start conversation {}", chat.chat))?;
    }

    let mut simulators = Vec::new();
    if demo {
        for chat in registry.chats().await {
            let sim = Arc::new(InboundSimulator::new(
                transport.clone(),
                &chat.id,
                DEMO_INTERVAL,
            ));
            let handle = sim.spawn();
            simulators.push((sim, handle));
        }
    }

    let router = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move { registry.run(stream).await })
    };

    info!(
        transport = transport.name(),
        chats = config.chats.len(),
        "Baitbot running"
    );
    let controller = Controller::new(Arc::clone(&registry));
    tokio::select! {
        result = run_console(&controller) => result?,
        _ = tokio::signal::ctrl_c() => info!("Interrupted, shutting down"),
    }

    for (sim, handle) in simulators {
        sim.stop();
        let _ = handle.await;
    }
    registry.shutdown();
    router.await.context("Router task failed")??;
    registry.teardown().await;
    Ok(())
}
