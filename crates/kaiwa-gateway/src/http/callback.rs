//! Webhook endpoint, POST /callback.
//!
//! Verifies `X-Line-Signature` over the raw body, then answers every text
//! message event in the delivery before responding. The platform only sees
//! `200 OK` once all replies are sent.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use kaiwa_core::KaiwaError;
use kaiwa_line::{verify_signature, CallbackRequest, Event, SIGNATURE_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::pipeline;

/// POST /callback
///
/// 400 on a missing/invalid signature or an unparseable body, 500 when the
/// completion, storage or reply step fails, 200 otherwise.
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, (StatusCode, Json<Value>)> {
    let receipt_id = uuid::Uuid::new_v4();
    info!(%receipt_id, bytes = body.len(), "webhook arrived");

    let signature = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    verify_signature(&state.config.line.channel_secret, &body, signature)
        .map_err(|e| error_response(receipt_id, KaiwaError::InvalidSignature(e.to_string())))?;

    debug!(%receipt_id, body = %String::from_utf8_lossy(&body), "request body");

    let request = CallbackRequest::from_slice(&body)
        .map_err(|e| error_response(receipt_id, KaiwaError::from(e)))?;

    for event in request.events {
        let Event::Message(message) = event else {
            debug!(%receipt_id, "ignoring non-message event");
            continue;
        };
        let Some(inbound) = message.inbound_text() else {
            debug!(%receipt_id, "ignoring message without text, user or reply token");
            continue;
        };

        pipeline::handle_text(&state, inbound)
            .await
            .map_err(|e| error_response(receipt_id, e))?;
    }

    Ok("OK")
}

fn error_response(receipt_id: uuid::Uuid, err: KaiwaError) -> (StatusCode, Json<Value>) {
    if err.is_client_error() {
        warn!(%receipt_id, code = err.code(), error = %err, "webhook rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": err.code(), "reason": err.to_string()})),
        )
    } else {
        error!(%receipt_id, code = err.code(), error = %err, "webhook processing failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": err.code()})),
        )
    }
}
