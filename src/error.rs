// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("GitHub host error: {0}")]
    Host(String),

    #[error("Path is not a file: {0}")]
    NotAFile(String),

    #[error("Failed to decode content of {path}: {message}")]
    Decode { path: String, message: String },

    #[error("Sync already in progress for repository {0}")]
    SyncInProgress(i64),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// True for errors that mean "the thing does not exist upstream or in
    /// the store", as opposed to transport or decoding failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound(_))
    }
}
