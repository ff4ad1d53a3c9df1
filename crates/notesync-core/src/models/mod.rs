//! Data models for notesync

mod folder;
mod note;
mod remote;
mod sync_config;

pub use folder::{Folder, FolderId};
pub use note::{CanvasBackground, Note, NoteId, NoteKind, SyncStatus};
pub use remote::{ConflictData, RemoteFileState, RepositoryRef, SyncStatusCounts};
pub use sync_config::{RepositorySyncConfig, DEFAULT_BASE_PATH, DEFAULT_BRANCH};
