use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] notesync_core::Error),
    #[error(transparent)]
    Remote(#[from] notesync_core::sync::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Edited note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Folder not found: {0}")]
    FolderNotFound(String),
    #[error("{0}")]
    AmbiguousFolder(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("No access token. Pass --token or set NOTESYNC_GITHUB_TOKEN.")]
    MissingToken,
    #[error("Sync is not configured. Run `notesync config set-repo <owner> <repo>` first.")]
    SyncNotConfigured,
    #[error("Remote file for note {0} does not exist")]
    NoRemoteVersion(String),
}
