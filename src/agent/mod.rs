//! Agent module - Reply scheduling per conversation
//!
//! This module provides the conversation core of Baitbot:
//!
//! - `ConversationAgent`: owns one conversation's history and preamble and
//!   decides when to reply (debounce, silence timeout, cancel-then-replace)
//! - `AgentRegistry`: maps chat ids to agents and routes inbound events
//! - `default_preamble`: the persona used when none is configured
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌───────────────────┐     ┌────────────────┐
//! │  Transport  │────>│ AgentRegistry │────>│ ConversationAgent │────>│ ReplyGenerator │
//! │  (stream)   │     │   (routing)   │     │  (per chat_id)    │     │   (backend)    │
//! └─────────────┘     └───────────────┘     └───────────────────┘     └────────────────┘
//!        ▲                                            │
//!        └────────────── send_message ────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use baitbot::agent::{AgentRegistry, AgentSettings};
//! use baitbot::channels::{ChatTransport, MemoryTransport};
//! use baitbot::providers::EchoGenerator;
//!
//! async fn run() -> baitbot::Result<()> {
//!     let transport = Arc::new(MemoryTransport::new("111"));
//!     transport.add_chat("1234567", "Hannah").await;
//!
//!     let registry = AgentRegistry::new(
//!         transport.clone(),
//!         Arc::new(EchoGenerator::new()),
//!         "111",
//!         AgentSettings::default(),
//!     );
//!     registry.register("Hannah", None).await?;
//!     registry.run(transport.message_stream()?).await
//! }
//! ```

pub mod conversation;
pub mod preamble;
pub mod registry;

pub use conversation::{AgentSettings, ConversationAgent};
pub use preamble::default_preamble;
pub use registry::AgentRegistry;
