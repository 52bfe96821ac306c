use std::time::Instant;

use tracing::info;

use crate::prompt::SystemPrompt;
use crate::provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError};

/// Holds the completion provider, the model settings and the system prompt.
/// Shared across requests via Arc in AppState.
pub struct AgentRuntime {
    provider: Box<dyn LlmProvider>,
    prompt: SystemPrompt,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl AgentRuntime {
    pub fn new(provider: Box<dyn LlmProvider>, prompt: SystemPrompt, model: String) -> Self {
        Self {
            provider,
            prompt,
            model,
            temperature: 0.0,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> &str {
        self.prompt.as_str()
    }

    /// Send an already-assembled turn sequence and return the reply.
    pub async fn complete(&self, turns: Vec<Message>) -> Result<ChatResponse, ProviderError> {
        let req = ChatRequest {
            model: self.model.clone(),
            messages: turns,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        info!(
            model = %req.model, provider = %self.provider.name(),
            turns = req.messages.len(), "processing chat request"
        );

        let started = Instant::now();
        let resp = self.provider.send(&req).await?;
        info!(
            latency_ms = started.elapsed().as_millis() as u64,
            tokens_in = resp.tokens_in,
            tokens_out = resp.tokens_out,
            stop_reason = %resp.stop_reason,
            "chat request complete"
        );
        Ok(resp)
    }
}
