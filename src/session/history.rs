//! Token-budgeted conversation history.
//!
//! `History` keeps the messages of one conversation in arrival order and
//! evicts from the front until the request it would produce fits the
//! backend's input limit:
//!
//! ```text
//! preamble_tokens + Σ message.tokens + REPLY_PRIMING_TOKENS <= max_tokens
//! ```
//!
//! Eviction drops whole messages, oldest first. The only other way an entry
//! leaves the history is [`History::remove_last_assistant`].

use std::collections::VecDeque;

use tracing::debug;

use super::tokens::REPLY_PRIMING_TOKENS;
use super::types::{Message, Role};

/// Default input ceiling for the generation backend.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 3000;

/// Ordered, token-bounded message history for a single conversation.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Message>,
    max_tokens: usize,
    preamble_tokens: usize,
    history_tokens: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_INPUT_TOKENS)
    }
}

impl History {
    /// Create an empty history bounded by `max_tokens`.
    ///
    /// # Example
    /// ```
    /// use baitbot::session::History;
    ///
    /// let history = History::new(3000);
    /// assert!(history.is_empty());
    /// assert_eq!(history.total_tokens(), 2); // reply priming only
    /// ```
    pub fn new(max_tokens: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_tokens,
            preamble_tokens: 0,
            history_tokens: 0,
        }
    }

    /// Append a message and evict the oldest entries until the budget holds.
    ///
    /// Never fails. A message that alone exceeds the budget is appended and
    /// then evicted in the same call, leaving the history empty.
    pub fn append(&mut self, message: Message) {
        self.history_tokens += message.tokens;
        self.entries.push_back(message);
        self.evict();
    }

    /// Update the token cost of the preamble that prefixes every request.
    ///
    /// A larger preamble leaves less room, so this re-applies eviction.
    pub fn set_preamble_tokens(&mut self, tokens: usize) {
        self.preamble_tokens = tokens;
        self.evict();
    }

    /// Token cost of the full request: preamble, history and reply priming.
    pub fn total_tokens(&self) -> usize {
        self.preamble_tokens + self.history_tokens + REPLY_PRIMING_TOKENS
    }

    /// The configured token ceiling.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    /// Remove the most recent message authored by our own account.
    ///
    /// Messages from the other party are left in place, including ones that
    /// arrived after the removed reply. Returns the removed message, or
    /// `None` when there is no own message in the history.
    ///
    /// # Example
    /// ```
    /// use baitbot::session::{History, Message, Role};
    ///
    /// let mut history = History::new(3000);
    /// history.append(Message::with_tokens(Role::User, "hi", 6));
    /// history.append(Message::with_tokens(Role::Assistant, "yo", 6));
    /// history.append(Message::with_tokens(Role::User, "u there", 7));
    ///
    /// let removed = history.remove_last_assistant().unwrap();
    /// assert_eq!(removed.content, "yo");
    /// assert_eq!(history.lines(None), vec!["user: hi", "user: u there"]);
    /// ```
    pub fn remove_last_assistant(&mut self) -> Option<Message> {
        let index = self
            .entries
            .iter()
            .rposition(|m| m.role == Role::Assistant)?;
        let removed = self.entries.remove(index)?;
        self.history_tokens -= removed.tokens;
        Some(removed)
    }

    /// Drop every entry. The preamble cost is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.history_tokens = 0;
    }

    /// Number of messages currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history holds no messages.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the messages, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    /// Format the last `n` messages (or all of them) as `"<role>: <text>"`.
    pub fn lines(&self, n: Option<usize>) -> Vec<String> {
        let skip = match n {
            Some(n) => self.entries.len().saturating_sub(n),
            None => 0,
        };
        self.entries.iter().skip(skip).map(Message::line).collect()
    }

    fn evict(&mut self) {
        let mut evicted = 0usize;
        while self.total_tokens() > self.max_tokens {
            let Some(oldest) = self.entries.pop_front() else {
                break;
            };
            self.history_tokens -= oldest.tokens;
            evicted += 1;
        }
        if evicted > 0 {
            debug!(
                evicted = evicted,
                remaining = self.entries.len(),
                tokens = self.total_tokens(),
                max_tokens = self.max_tokens,
                "Evicted oldest history entries"
            );
        }
    }
}
