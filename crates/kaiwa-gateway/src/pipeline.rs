//! Per-message reply pipeline: history, completion, persistence, reply.

use chrono::Utc;
use kaiwa_core::{InboundText, KaiwaError};
use kaiwa_line::split_reply_with_limit;
use tracing::{info, instrument, warn};

use crate::app::AppState;

/// Answer one text message and return the segments that were sent.
///
/// The exchange is stored before the reply goes out; a failed reply does not
/// undo it.
#[instrument(skip_all, fields(user_id = %inbound.user_id))]
pub async fn handle_text(state: &AppState, inbound: InboundText) -> Result<Vec<String>, KaiwaError> {
    let lock = state.user_lock(&inbound.user_id);
    let _guard = match &lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    let session = state.store.session().map_err(database_error)?;
    if !session.has_user(&inbound.user_id).map_err(database_error)? {
        info!("first message from this user");
    }
    let turns = state
        .history
        .assemble(
            &session,
            &inbound.user_id,
            state.agent.system_prompt(),
            &inbound.text,
            Utc::now(),
        )
        .map_err(database_error)?;

    let resp = state
        .agent
        .complete(turns)
        .await
        .map_err(|e| KaiwaError::LlmProvider(e.to_string()))?;

    session
        .append(&inbound.user_id, inbound.timestamp, &inbound.text, &resp.content)
        .map_err(database_error)?;
    drop(session);

    let segments = split_reply_with_limit(&resp.content, state.config.line.max_reply_messages);
    if segments.is_empty() {
        warn!("model returned a blank reply, nothing sent");
        return Ok(segments);
    }

    state
        .messenger
        .reply(&inbound.reply_token, &segments)
        .await
        .map_err(|e| KaiwaError::Channel {
            channel: state.messenger.name().to_string(),
            reason: e.to_string(),
        })?;

    info!(segments = segments.len(), "reply sent");
    Ok(segments)
}

fn database_error(e: kaiwa_store::StoreError) -> KaiwaError {
    KaiwaError::Database(e.to_string())
}
