use serde::{Deserialize, Serialize};
use std::fmt;

/// Platform-native user identifier (a LINE `userId` such as `U4af4980629...`).
///
/// Exchanges are grouped by this value; it is never generated locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Opaque token that routes a reply back to the originating conversation.
///
/// Single use; the platform expires it shortly after the event is delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReplyToken(pub String);

impl ReplyToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ReplyToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Text message received from a user, reduced to what the reply pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundText {
    pub user_id: UserId,
    /// Event time reported by the platform.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub text: String,
    pub reply_token: ReplyToken,
}
