//! Webhook signature check.
//!
//! LINE signs each delivery with `base64(HMAC-SHA256(channel_secret, body))`
//! in the `X-Line-Signature` header.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the body signature.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing X-Line-Signature header")]
    Missing,

    #[error("X-Line-Signature is not valid base64")]
    Malformed,

    #[error("invalid HMAC key length")]
    InvalidKey,

    #[error("HMAC signature mismatch")]
    Mismatch,
}

/// Verify `signature` (the raw header value) against `body`.
///
/// The comparison runs in constant time.
pub fn verify_signature(
    channel_secret: &str,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let signature = signature
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;

    let expected = STANDARD
        .decode(signature)
        .map_err(|_| SignatureError::Malformed)?;

    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);

    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the signature LINE would send for `body`.
pub fn sign(channel_secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .map_err(|_| SignatureError::InvalidKey)?;
    mac.update(body);
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
