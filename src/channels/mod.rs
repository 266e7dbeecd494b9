//! Channels module - Chat platform transports
//!
//! This module provides the boundary between Baitbot and the chat platform.
//! A transport resolves conversations, fetches recent history, sends and
//! deletes messages, and delivers every inbound event (including the echo of
//! our own sends) as a single stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       ChatTransport                         │
//! │                                                             │
//! │  ┌─────────────────┐             ┌──────────────────┐       │
//! │  │ MemoryTransport │<────────────│ InboundSimulator │       │
//! │  └────────┬────────┘   inject    └──────────────────┘       │
//! │           │                                                 │
//! │     ┌─────┴─────┐                                           │
//! │     │MessageBus │──── message_stream() ───> AgentRegistry   │
//! │     │ (inbound) │                                           │
//! │     └───────────┘                                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A real platform integration implements [`ChatTransport`] the same way
//! [`MemoryTransport`] does.

pub mod memory;
pub mod simulator;
mod types;

pub use memory::MemoryTransport;
pub use simulator::InboundSimulator;
pub use types::{ChatInfo, ChatTransport};
