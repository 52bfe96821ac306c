//! Shared fixtures for router and pipeline tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kaiwa_agent::prompt::SystemPrompt;
use kaiwa_agent::{AgentRuntime, ChatRequest, ChatResponse, LlmProvider, ProviderError};
use kaiwa_core::{KaiwaConfig, ReplyToken};
use kaiwa_line::{LineError, Messenger};
use kaiwa_store::ExchangeStore;

use crate::app::AppState;

pub const SECRET: &str = "test-channel-secret";
pub const SYSTEM: &str = "TEST SYSTEM PROMPT";

pub type Requests = Arc<Mutex<Vec<ChatRequest>>>;
pub type Replies = Arc<Mutex<Vec<(String, Vec<String>)>>>;

/// Completion provider returning a fixed reply (or a fixed API error).
pub struct ScriptedProvider {
    outcome: Result<String, u16>,
    seen: Requests,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        Self {
            outcome: Ok(text.to_string()),
            seen: Requests::default(),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            outcome: Err(status),
            seen: Requests::default(),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, req: &ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.seen.lock().unwrap().push(req.clone());
        match &self.outcome {
            Ok(text) => Ok(ChatResponse {
                content: text.clone(),
                model: req.model.clone(),
                tokens_in: 0,
                tokens_out: 0,
                stop_reason: "stop".to_string(),
            }),
            Err(status) => Err(ProviderError::Api {
                status: *status,
                message: "scripted failure".to_string(),
            }),
        }
    }
}

/// Messenger that records replies instead of calling LINE.
pub struct RecordingMessenger {
    sent: Replies,
}

#[async_trait]
impl Messenger for RecordingMessenger {
    fn name(&self) -> &str {
        "recording"
    }

    async fn reply(&self, reply_token: &ReplyToken, texts: &[String]) -> Result<(), LineError> {
        self.sent
            .lock()
            .unwrap()
            .push((reply_token.to_string(), texts.to_vec()));
        Ok(())
    }
}

/// Handles for inspecting what a test state did.
pub struct Probes {
    pub requests: Requests,
    pub replies: Replies,
}

pub fn test_config() -> KaiwaConfig {
    let mut config = KaiwaConfig::default();
    config.providers.openai.api_key = "sk-test".to_string();
    config.line.channel_secret = SECRET.to_string();
    config.line.access_token = "access".to_string();
    config
}

pub fn test_state(provider: ScriptedProvider) -> (tempfile::TempDir, Arc<AppState>, Probes) {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config();
    config.database.path = dir.path().join("messages.db").display().to_string();

    let store = ExchangeStore::open(&config.database.path).expect("open store");
    let requests = Arc::clone(&provider.seen);
    let agent = AgentRuntime::new(
        Box::new(provider),
        SystemPrompt::new(SYSTEM),
        config.agent.model.clone(),
    );
    let replies = Replies::default();
    let messenger = RecordingMessenger {
        sent: Arc::clone(&replies),
    };

    let state = Arc::new(AppState::new(config, agent, store, Box::new(messenger)));
    (dir, state, Probes { requests, replies })
}

/// A one-event webhook body carrying a text message.
pub fn text_event_body(user_id: &str, text: &str, timestamp_ms: i64, reply_token: &str) -> String {
    serde_json::json!({
        "destination": "Ubot",
        "events": [{
            "type": "message",
            "mode": "active",
            "timestamp": timestamp_ms,
            "source": {"type": "user", "userId": user_id},
            "replyToken": reply_token,
            "webhookEventId": "01TESTEVENT",
            "deliveryContext": {"isRedelivery": false},
            "message": {"type": "text", "id": "1", "text": text}
        }]
    })
    .to_string()
}
