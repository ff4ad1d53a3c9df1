//! Remote-side sync models

use serde::{Deserialize, Serialize};

use super::{Note, SyncStatus};

/// A remote file as fetched for one sync attempt (never persisted)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileState {
    pub content: String,
    /// Last modification time (Unix ms)
    pub modified_at: i64,
    /// Content hash / version marker (blob SHA)
    pub hash: String,
}

/// A detected conflict, handed to whoever picks the resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictData {
    pub local_note: Note,
    pub remote: RemoteFileState,
    pub reason: String,
}

/// Repository visible to the configured credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    pub default_branch: Option<String>,
    pub private: bool,
}

/// Note counts per sync status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusCounts {
    pub pending: usize,
    pub synced: usize,
    pub conflicts: usize,
    pub errors: usize,
    pub total: usize,
}

impl SyncStatusCounts {
    /// Add `count` notes with `status`.
    pub fn record(&mut self, status: SyncStatus, count: usize) {
        match status {
            SyncStatus::Pending => self.pending += count,
            SyncStatus::Synced => self.synced += count,
            SyncStatus::Conflict => self.conflicts += count,
            SyncStatus::Error => self.errors += count,
        }
        self.total += count;
    }
}
