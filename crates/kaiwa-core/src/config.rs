use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{KaiwaError, Result};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_MODEL: &str = "gpt-4-1106-preview";
pub const DEFAULT_HISTORY_WINDOW_HOURS: i64 = 24;
/// LINE accepts at most five message objects per reply call.
pub const MAX_REPLY_MESSAGES: usize = 5;

/// Plain environment variables honoured on top of `KAIWA_*` overrides.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const LINE_ACCESS_TOKEN_ENV: &str = "LINE_ACCESS_TOKEN";
pub const LINE_CHANNEL_SECRET_ENV: &str = "LINE_CHANNEL_SECRET";

/// Top-level config (kaiwa.toml + KAIWA_* env overrides + platform env vars).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KaiwaConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub line: LineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature. Zero keeps replies reproducible.
    #[serde(default)]
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// File holding the system instruction. The built-in prompt is used when unset.
    pub system_prompt_path: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: 0.0,
            max_tokens: None,
            system_prompt_path: None,
        }
    }
}

/// How much past conversation is replayed to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_window_hours")]
    pub window_hours: i64,
    /// Keep only the most recent N exchanges of the window. `None` = unbounded.
    pub max_exchanges: Option<usize>,
    /// Serialize history read + append per user so rapid messages don't race.
    #[serde(default = "bool_true")]
    pub serialize_per_user: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            window_hours: DEFAULT_HISTORY_WINDOW_HOURS,
            max_exchanges: None,
            serialize_per_user: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai: OpenAiProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_openai_base_url(),
        }
    }
}

/// LINE Messaging API channel credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default)]
    pub channel_secret: String,
    #[serde(default)]
    pub access_token: String,
    #[serde(default = "default_line_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_max_reply_messages")]
    pub max_reply_messages: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_secret: String::new(),
            access_token: String::new(),
            api_base_url: default_line_api_base_url(),
            max_reply_messages: MAX_REPLY_MESSAGES,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_window_hours() -> i64 {
    DEFAULT_HISTORY_WINDOW_HOURS
}
fn default_db_path() -> String {
    "messages.db".to_string()
}
fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
fn default_line_api_base_url() -> String {
    "https://api.line.me".to_string()
}
fn default_max_reply_messages() -> usize {
    MAX_REPLY_MESSAGES
}

impl KaiwaConfig {
    /// Load config from a TOML file with KAIWA_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. KAIWA_CONFIG env var
    ///   3. ./kaiwa.toml
    ///
    /// A missing file is not an error; every key has a default or comes from env.
    /// Nested keys use a double underscore: `KAIWA_HISTORY__MAX_EXCHANGES=20`.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .or_else(|| std::env::var("KAIWA_CONFIG").ok())
            .unwrap_or_else(|| "kaiwa.toml".to_string());

        let mut config: KaiwaConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("KAIWA_").split("__"))
            .extract()
            .map_err(|e| KaiwaError::Config(e.to_string()))?;

        config.apply_platform_env();
        Ok(config)
    }

    /// Overlay the credential variables the platform dashboards hand out.
    ///
    /// Read directly rather than through figment so hex secrets are never
    /// coerced into numbers.
    fn apply_platform_env(&mut self) {
        if let Some(key) = non_empty_env(OPENAI_API_KEY_ENV) {
            self.providers.openai.api_key = key;
        }
        if let Some(token) = non_empty_env(LINE_ACCESS_TOKEN_ENV) {
            self.line.access_token = token;
        }
        if let Some(secret) = non_empty_env(LINE_CHANNEL_SECRET_ENV) {
            self.line.channel_secret = secret;
        }
    }

    /// Reject configurations the gateway cannot serve with.
    pub fn validate(&self) -> Result<()> {
        if self.providers.openai.api_key.trim().is_empty() {
            return Err(KaiwaError::Config(format!(
                "OpenAI API key is missing (set {OPENAI_API_KEY_ENV})"
            )));
        }
        if self.line.channel_secret.trim().is_empty() {
            return Err(KaiwaError::Config(format!(
                "LINE channel secret is missing (set {LINE_CHANNEL_SECRET_ENV})"
            )));
        }
        if self.line.access_token.trim().is_empty() {
            return Err(KaiwaError::Config(format!(
                "LINE access token is missing (set {LINE_ACCESS_TOKEN_ENV})"
            )));
        }
        if !(1..=MAX_REPLY_MESSAGES).contains(&self.line.max_reply_messages) {
            return Err(KaiwaError::Config(format!(
                "line.max_reply_messages must be between 1 and {MAX_REPLY_MESSAGES}, got {}",
                self.line.max_reply_messages
            )));
        }
        if self.history.window_hours <= 0 {
            return Err(KaiwaError::Config(format!(
                "history.window_hours must be positive, got {}",
                self.history.window_hours
            )));
        }
        Ok(())
    }

    /// History lookback as a chrono duration.
    pub fn history_window(&self) -> chrono::Duration {
        chrono::Duration::hours(self.history.window_hours)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn with_credentials(config: &mut KaiwaConfig) {
        config.providers.openai.api_key = "sk-test".to_string();
        config.line.channel_secret = "secret".to_string();
        config.line.access_token = "token".to_string();
    }

    #[test]
    fn built_in_defaults() {
        let config = KaiwaConfig::default();
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.database.path, "messages.db");
        assert_eq!(config.agent.model, "gpt-4-1106-preview");
        assert_eq!(config.agent.temperature, 0.0);
        assert_eq!(config.history.window_hours, 24);
        assert!(config.history.max_exchanges.is_none());
        assert!(config.history.serialize_per_user);
        assert_eq!(config.line.max_reply_messages, 5);
    }

    #[test]
    fn loads_toml_and_platform_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "kaiwa.toml",
                r#"
                [gateway]
                port = 8080

                [history]
                max_exchanges = 10
                "#,
            )?;
            jail.set_env("OPENAI_API_KEY", "sk-from-env");
            jail.set_env("LINE_ACCESS_TOKEN", "access");
            jail.set_env("LINE_CHANNEL_SECRET", "0123456789");

            let config = KaiwaConfig::load(Some("kaiwa.toml")).expect("load");
            assert_eq!(config.gateway.port, 8080);
            assert_eq!(config.history.max_exchanges, Some(10));
            assert_eq!(config.providers.openai.api_key, "sk-from-env");
            assert_eq!(config.line.access_token, "access");
            assert_eq!(config.line.channel_secret, "0123456789");
            assert!(config.validate().is_ok());
            Ok(())
        });
    }

    #[test]
    fn prefixed_env_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("KAIWA_AGENT__MODEL", "gpt-4o");
            jail.set_env("KAIWA_HISTORY__WINDOW_HOURS", "6");

            let config = KaiwaConfig::load(Some("missing.toml")).expect("load");
            assert_eq!(config.agent.model, "gpt-4o");
            assert_eq!(config.history.window_hours, 6);
            assert_eq!(config.history_window(), chrono::Duration::hours(6));
            Ok(())
        });
    }

    #[test]
    fn validate_requires_credentials() {
        let mut config = KaiwaConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));

        with_credentials(&mut config);
        assert!(config.validate().is_ok());

        config.line.channel_secret.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_bounds_reply_message_count() {
        let mut config = KaiwaConfig::default();
        with_credentials(&mut config);

        config.line.max_reply_messages = 0;
        assert!(config.validate().is_err());
        config.line.max_reply_messages = 6;
        assert!(config.validate().is_err());
        config.line.max_reply_messages = 3;
        assert!(config.validate().is_ok());
    }
}
