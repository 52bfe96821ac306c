pub mod config;
pub mod error;
pub mod types;

pub use config::KaiwaConfig;
pub use error::{KaiwaError, Result};
pub use types::{InboundText, ReplyToken, UserId};
