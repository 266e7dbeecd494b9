//! Baitbot - Automated, human-like replies in ongoing chat conversations

pub mod agent;
pub mod bus;
pub mod channels;
pub mod config;
pub mod control;
pub mod error;
pub mod providers;
pub mod session;
pub mod utils;

pub use agent::{AgentRegistry, AgentSettings, ConversationAgent};
pub use bus::{ChatMessage, MessageBus};
pub use channels::{ChatInfo, ChatTransport, MemoryTransport};
pub use config::Config;
pub use error::{BaitError, GenerationError, Result};
pub use providers::{EchoGenerator, OpenAIGenerator, ReplyGenerator};
pub use session::{History, Message, Role, TokenCounter};
