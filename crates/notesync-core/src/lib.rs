//! notesync-core - Core library for notesync
//!
//! This crate contains the note/folder models, the libSQL-backed local store,
//! and the local-first sync engine that mirrors notes as files in a GitHub
//! repository (diffing, conflict detection and resolution).

pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{
    ConflictData, Folder, FolderId, Note, NoteId, NoteKind, RemoteFileState,
    RepositorySyncConfig, SyncStatus,
};
