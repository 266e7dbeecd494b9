//! Synthetic inbound traffic for demo runs.
//!
//! Publishes a message into a conversation at a fixed interval. Every fourth
//! message is attributed to our own account, which exercises the self-echo
//! path of the conversation agents.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::memory::MemoryTransport;

/// Sender id used for the simulated other party.
pub const SIMULATED_SENDER_ID: &str = "222";

/// Drives a [`MemoryTransport`] with periodic inbound messages.
pub struct InboundSimulator {
    transport: Arc<MemoryTransport>,
    chat_id: String,
    interval: Duration,
    shutdown_tx: watch::Sender<bool>,
}

impl InboundSimulator {
    /// Creates a simulator for one conversation.
    pub fn new(transport: Arc<MemoryTransport>, chat_id: &str, interval: Duration) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            transport,
            chat_id: chat_id.to_string(),
            interval,
            shutdown_tx,
        }
    }

    /// Sender id for the `i`-th simulated message.
    pub fn sender_for(&self, i: u64) -> &str {
        if i % 4 == 0 {
            self.transport.own_id()
        } else {
            SIMULATED_SENDER_ID
        }
    }

    /// Spawns the publishing task. It runs until [`InboundSimulator::stop`]
    /// is called or the inbound stream is dropped.
    pub fn spawn(self: &Arc<Self>) -> JoinHandle<()> {
        let this = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            info!(chat_id = %this.chat_id, "Inbound simulator started");
            let mut ticker = tokio::time::interval(this.interval);
            // The first tick completes immediately
            ticker.tick().await;
            let mut i: u64 = 1;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let sender = this.sender_for(i);
                        let text = format!("Message {}", i);
                        debug!(chat_id = %this.chat_id, sender = %sender, "Simulating inbound message");
                        if let Err(e) = this.transport.inject(&this.chat_id, sender, &text).await {
                            warn!(chat_id = %this.chat_id, error = %e, "Inbound simulator stopping");
                            break;
                        }
                        i += 1;
                    }
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                }
            }
            info!(chat_id = %this.chat_id, "Inbound simulator stopped");
        })
    }

    /// Signals the publishing task to exit.
    pub fn stop(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::ChatTransport;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_every_fourth_message_is_own() {
        let transport = Arc::new(MemoryTransport::new("111"));
        let sim = InboundSimulator::new(transport, "chat", Duration::from_secs(1));
        assert_eq!(sim.sender_for(1), SIMULATED_SENDER_ID);
        assert_eq!(sim.sender_for(3), SIMULATED_SENDER_ID);
        assert_eq!(sim.sender_for(4), "111");
        assert_eq!(sim.sender_for(8), "111");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publishes_until_stopped() {
        let transport = Arc::new(MemoryTransport::new("111"));
        transport.add_chat("chat", "Hannah").await;
        let mut stream = transport.message_stream().unwrap();

        let sim = Arc::new(InboundSimulator::new(
            Arc::clone(&transport),
            "chat",
            Duration::from_secs(2),
        ));
        let handle = sim.spawn();

        let first = stream.next().await.unwrap();
        assert_eq!(first.text, "Message 1");
        assert_eq!(first.sender_id, SIMULATED_SENDER_ID);
        let second = stream.next().await.unwrap();
        assert_eq!(second.text, "Message 2");

        sim.stop();
        handle.await.unwrap();
    }
}
