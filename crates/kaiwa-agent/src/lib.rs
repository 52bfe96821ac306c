pub mod history;
pub mod openai;
pub mod prompt;
pub mod provider;
pub mod runtime;

pub use history::HistoryAssembler;
pub use provider::{ChatRequest, ChatResponse, LlmProvider, Message, ProviderError, Role};
pub use runtime::AgentRuntime;
