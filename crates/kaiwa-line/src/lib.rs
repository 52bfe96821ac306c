//! LINE Messaging API integration: webhook signatures, event payloads,
//! reply chunking and the reply client.

pub mod chunker;
pub mod client;
pub mod error;
pub mod event;
pub mod messenger;
pub mod signature;

pub use chunker::{split_reply, split_reply_with_limit, MAX_REPLY_SEGMENTS};
pub use client::LineClient;
pub use error::LineError;
pub use event::{CallbackRequest, Event};
pub use messenger::Messenger;
pub use signature::{verify_signature, SignatureError, SIGNATURE_HEADER};
