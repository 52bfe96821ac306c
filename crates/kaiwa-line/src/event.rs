//! Webhook payload types.
//!
//! Only the fields the reply pipeline reads are modelled; everything else in
//! the platform's event objects is ignored during deserialization.

use chrono::{DateTime, Utc};
use kaiwa_core::{InboundText, ReplyToken, UserId};
use serde::Deserialize;

/// Body of a `POST /callback` delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackRequest {
    /// Bot user ID that received the events.
    #[serde(default)]
    pub destination: String,
    /// Empty for the console's "Verify" request.
    #[serde(default)]
    pub events: Vec<Event>,
}

impl CallbackRequest {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Message(MessageEvent),
    /// follow, unfollow, postback, join, ...
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub source: Source,
    pub reply_token: Option<String>,
    pub message: MessageContent,
    pub webhook_event_id: Option<String>,
}

impl MessageEvent {
    /// Reduce a text message event to what the reply pipeline needs.
    ///
    /// `None` for non-text messages, sources without a user ID, events
    /// without a reply token, or timestamps outside chrono's range.
    pub fn inbound_text(&self) -> Option<InboundText> {
        let MessageContent::Text { text, .. } = &self.message else {
            return None;
        };
        let user_id = self.source.user_id()?;
        let reply_token = self.reply_token.as_deref()?;
        let timestamp = DateTime::<Utc>::from_timestamp_millis(self.timestamp)?;

        Some(InboundText {
            user_id: UserId::from(user_id),
            timestamp,
            text: text.clone(),
            reply_token: ReplyToken::from(reply_token),
        })
    }
}

/// Where the event came from. Group and room events only carry the sender's
/// user ID when the user has consented to share it.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Source {
    User {
        #[serde(rename = "userId")]
        user_id: String,
    },
    Group {
        #[serde(rename = "groupId")]
        group_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
    Room {
        #[serde(rename = "roomId")]
        room_id: String,
        #[serde(rename = "userId")]
        user_id: Option<String>,
    },
}

impl Source {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Source::User { user_id } => Some(user_id),
            Source::Group { user_id, .. } | Source::Room { user_id, .. } => user_id.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text { id: String, text: String },
    /// image, video, audio, file, location, sticker
    #[serde(other)]
    Other,
}
