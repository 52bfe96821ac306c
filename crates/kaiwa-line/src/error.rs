use thiserror::Error;

/// Errors from the LINE Messaging API client.
#[derive(Debug, Error)]
pub enum LineError {
    /// The HTTP request could not be sent or its response read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("LINE API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// More messages were passed than one reply call accepts.
    #[error("too many messages for one reply: {count} (max {max})")]
    TooManyMessages { count: usize, max: usize },
}
