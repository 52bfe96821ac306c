//! Reply client for the LINE Messaging API.

use async_trait::async_trait;
use kaiwa_core::ReplyToken;
use serde::Serialize;
use tracing::{debug, warn};

use crate::chunker::MAX_REPLY_SEGMENTS;
use crate::error::LineError;
use crate::messenger::Messenger;

const REPLY_PATH: &str = "/v2/bot/message/reply";

pub struct LineClient {
    client: reqwest::Client,
    access_token: String,
    base_url: String,
}

impl LineClient {
    pub fn new(access_token: String, base_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            access_token,
            base_url: base_url
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| "https://api.line.me".to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyMessageRequest<'a> {
    reply_token: &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

fn build_reply_body<'a>(reply_token: &'a ReplyToken, texts: &'a [String]) -> ReplyMessageRequest<'a> {
    ReplyMessageRequest {
        reply_token: reply_token.as_str(),
        messages: texts
            .iter()
            .map(|text| TextMessage {
                kind: "text",
                text: text.as_str(),
            })
            .collect(),
    }
}

#[async_trait]
impl Messenger for LineClient {
    fn name(&self) -> &str {
        "line"
    }

    async fn reply(&self, reply_token: &ReplyToken, texts: &[String]) -> Result<(), LineError> {
        if texts.is_empty() {
            debug!("nothing to reply");
            return Ok(());
        }
        if texts.len() > MAX_REPLY_SEGMENTS {
            return Err(LineError::TooManyMessages {
                count: texts.len(),
                max: MAX_REPLY_SEGMENTS,
            });
        }

        let url = format!("{}{}", self.base_url, REPLY_PATH);
        let body = build_reply_body(reply_token, texts);
        debug!(messages = texts.len(), "sending LINE reply");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            warn!(status, body = %text, "LINE reply API error");
            return Err(LineError::Api {
                status,
                message: text,
            });
        }

        Ok(())
    }
}
