//! Database layer for notesync

mod config_repository;
mod connection;
mod folder_repository;
mod migrations;
mod note_repository;

pub use config_repository::{ConfigRepository, LibSqlConfigRepository};
pub use connection::Database;
pub use folder_repository::{FolderRepository, LibSqlFolderRepository};
pub use note_repository::{LibSqlNoteRepository, NoteRepository};

use crate::models::{FolderId, SyncStatus};

/// Selection for note listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFilter {
    pub folder_id: Option<FolderId>,
    pub sync_status: Option<SyncStatus>,
    pub limit: Option<usize>,
}

impl NoteFilter {
    #[must_use]
    pub fn in_folder(folder_id: FolderId) -> Self {
        Self {
            folder_id: Some(folder_id),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_status(status: SyncStatus) -> Self {
        Self {
            sync_status: Some(status),
            ..Self::default()
        }
    }
}
