//! Remote file store abstraction.

use thiserror::Error;

use crate::models::{RemoteFileState, RepositoryRef, RepositorySyncConfig};

#[derive(Debug, Error)]
pub enum RemoteError {
    /// The remote rejected a write because the file changed since it was read
    #[error("Remote file changed since it was read: {0}")]
    Conflict(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Malformed remote content: {0}")]
    Malformed(String),
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
}

impl RemoteError {
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Text files addressed by path inside one branch of one repository.
#[allow(async_fn_in_trait)]
pub trait RemoteFileStore {
    /// Current version of the file, `None` if it does not exist.
    async fn read_file(&self, path: &str) -> RemoteResult<Option<RemoteFileState>>;

    /// Write `content` to `path` and return the new hash.
    ///
    /// `known_hash` is the version the caller last saw. The write fails with
    /// [`RemoteError::Conflict`] when the remote has moved past it. `None`
    /// creates the file.
    async fn write_file(
        &self,
        path: &str,
        content: &str,
        known_hash: Option<&str>,
    ) -> RemoteResult<String>;

    /// Repositories the credential can see.
    async fn list_repositories(&self) -> RemoteResult<Vec<RepositoryRef>>;
}

/// Builds a store for a given repository config; the credential travels with
/// the config into the store.
pub trait RemoteConnector {
    type Store: RemoteFileStore;

    fn connect(&self, config: &RepositorySyncConfig) -> RemoteResult<Self::Store>;
}
