use thiserror::Error;

#[derive(Debug, Error)]
pub enum KaiwaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Channel error ({channel}): {reason}")]
    Channel { channel: String, reason: String },
}

impl KaiwaError {
    /// Short error code string used in logs and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            KaiwaError::Config(_) => "CONFIG_ERROR",
            KaiwaError::InvalidSignature(_) => "INVALID_SIGNATURE",
            KaiwaError::InvalidPayload(_) => "INVALID_PAYLOAD",
            KaiwaError::Database(_) => "DATABASE_ERROR",
            KaiwaError::LlmProvider(_) => "LLM_PROVIDER_ERROR",
            KaiwaError::Channel { .. } => "CHANNEL_ERROR",
        }
    }

    /// Whether the fault lies with the caller rather than with this service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            KaiwaError::InvalidSignature(_) | KaiwaError::InvalidPayload(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, KaiwaError>;
