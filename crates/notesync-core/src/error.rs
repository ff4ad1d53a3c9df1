//! Error types for notesync-core

use thiserror::Error;

use crate::sync::RemoteError;

/// Result type alias using notesync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in notesync-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Note, folder or config entry not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote file store error
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// A sync pass is already running
    #[error("A sync operation is already in progress")]
    SyncInProgress,
}
