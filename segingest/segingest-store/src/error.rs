/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode media paths: {0}")]
    Json(#[from] serde_json::Error),

    #[error("write cancelled")]
    Cancelled,

    #[error("unknown signal type '{0}'")]
    UnknownSignalType(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
