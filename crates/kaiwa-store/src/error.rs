use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid stored timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
