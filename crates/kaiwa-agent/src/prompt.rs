use std::path::Path;
use tracing::{info, warn};

/// Per-file size cap (characters). Longer prompt files are truncated.
const MAX_PROMPT_CHARS: usize = 20_000;

/// Instruction used when no prompt file is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
あなたはLINEで会話する親切なアシスタントです。\
ユーザーの質問に日本語で、簡潔かつ丁寧に答えてください。\
一度に送れるメッセージは短い文ごとに分割されるため、一文を短く保ってください。";

/// The fixed system instruction inserted before every new user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    text: String,
}

impl SystemPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read the instruction from `path`, falling back to [`DEFAULT_SYSTEM_PROMPT`]
    /// when the path is unset, unreadable, or blank.
    pub fn load(path: Option<&str>) -> Self {
        let Some(path) = path else {
            info!("using built-in system prompt");
            return Self::default();
        };

        match std::fs::read_to_string(Path::new(path)) {
            Ok(content) if !content.trim().is_empty() => {
                let text = truncate_chars(content.trim(), MAX_PROMPT_CHARS);
                info!(path, chars = text.chars().count(), "loaded system prompt");
                Self { text }
            }
            Ok(_) => {
                warn!(path, "system prompt file is empty, using built-in prompt");
                Self::default()
            }
            Err(e) => {
                warn!(path, error = %e, "failed to read system prompt, using built-in prompt");
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Default for SystemPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_SYSTEM_PROMPT)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
