//! Rebuilds the turn sequence sent to the completion API.
//!
//! Layout for a user with N exchanges inside the lookback window:
//!
//! ```text
//! user(1) assistant(1) ... user(N) assistant(N) system(prompt) user(new message)
//! ```
//!
//! The system turn sits after the history, directly before the new message.

use chrono::{DateTime, Duration, Utc};
use kaiwa_core::UserId;
use kaiwa_store::{Exchange, StoreError, StoreSession};
use tracing::debug;

use crate::provider::Message;

/// Assembles chat turns from a user's recent exchanges.
#[derive(Debug, Clone)]
pub struct HistoryAssembler {
    window: Duration,
    max_exchanges: Option<usize>,
}

impl HistoryAssembler {
    /// `window` is how far back exchanges are replayed; `max_exchanges`
    /// optionally caps how many of them are kept (most recent win).
    pub fn new(window: Duration, max_exchanges: Option<usize>) -> Self {
        Self {
            window,
            max_exchanges,
        }
    }

    /// Load `user_id`'s exchanges newer than `now - window` and build the turns
    /// for answering `inbound`.
    pub fn assemble(
        &self,
        session: &StoreSession,
        user_id: &UserId,
        system_prompt: &str,
        inbound: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Message>, StoreError> {
        let since = now - self.window;
        let exchanges = session.exchanges_since(user_id, since, self.max_exchanges)?;
        debug!(user_id = %user_id, exchanges = exchanges.len(), "history loaded");
        Ok(build_turns(&exchanges, system_prompt, inbound))
    }
}

impl Default for HistoryAssembler {
    fn default() -> Self {
        Self::new(
            Duration::hours(kaiwa_core::config::DEFAULT_HISTORY_WINDOW_HOURS),
            None,
        )
    }
}

/// Turn sequence for `exchanges` (assumed oldest first) followed by the system
/// instruction and the new user message. Always `2 * exchanges.len() + 2` turns.
pub fn build_turns(exchanges: &[Exchange], system_prompt: &str, inbound: &str) -> Vec<Message> {
    let mut turns = Vec::with_capacity(exchanges.len() * 2 + 2);
    for exchange in exchanges {
        turns.push(Message::user(exchange.inbound_text.as_str()));
        turns.push(Message::assistant(exchange.outbound_text.as_str()));
    }
    turns.push(Message::system(system_prompt));
    turns.push(Message::user(inbound));
    turns
}
