use async_trait::async_trait;
use kaiwa_core::ReplyToken;

use crate::error::LineError;

/// Outbound side of a chat channel.
///
/// Implementations must be `Send + Sync` so one instance can be shared by
/// every request handler.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Stable lowercase identifier for logs (e.g. `"line"`).
    fn name(&self) -> &str;

    /// Answer the conversation identified by `reply_token` with `texts`,
    /// one chat bubble per entry, in order.
    async fn reply(&self, reply_token: &ReplyToken, texts: &[String]) -> Result<(), LineError>;
}
