//! Conflict detection between a local note and its remote file, and the
//! resolutions a user can pick.

use crate::models::{Note, RemoteFileState, SyncStatus};
use crate::services::LocalStore;
use crate::Result;

use super::diff::{generate_diff, DiffKind};

pub const REMOTE_NEWER_REASON: &str = "Remote version is newer and content differs";

/// Outcome of comparing a local note with the current remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResult {
    /// Hashes match
    InSync,
    /// Hashes differ but the bodies are byte-identical; the remote hash can be adopted
    ContentMatches,
    /// Local edit is at least as recent as the remote one and wins
    LocalNewer,
    RemoteNewer { reason: String },
}

impl ConflictResult {
    pub const fn has_conflict(&self) -> bool {
        matches!(self, Self::RemoteNewer { .. })
    }
}

/// Decide whether pushing `local` over `remote` would lose a remote edit.
///
/// When contents differ and the local note is not older than the remote
/// file, local wins without asking. Clock skew between devices can therefore
/// drop a remote edit; this is accepted policy.
pub fn detect_conflict(local: &Note, remote: &RemoteFileState) -> ConflictResult {
    if local.remote_hash.as_deref() == Some(remote.hash.as_str()) {
        return ConflictResult::InSync;
    }
    if local.content == remote.content {
        return ConflictResult::ContentMatches;
    }
    if remote.modified_at > local.updated_at {
        return ConflictResult::RemoteNewer {
            reason: REMOTE_NEWER_REASON.to_string(),
        };
    }
    ConflictResult::LocalNewer
}

/// Keep the local version: the note goes back to `pending` so the next push
/// overwrites the remote file. Content is untouched.
pub async fn resolve_keep_local(store: &LocalStore, note: &Note) -> Result<Note> {
    store.set_sync_status(&note.id, SyncStatus::Pending).await?;
    tracing::debug!("Keeping local version of note {}", note.id);
    Ok(Note {
        sync_status: SyncStatus::Pending,
        ..note.clone()
    })
}

/// Keep the remote version: local content, hash and timestamps are replaced
/// and the note is `synced`.
pub async fn resolve_keep_remote(
    store: &LocalStore,
    note: &Note,
    remote: &RemoteFileState,
) -> Result<Note> {
    let updated = store.apply_remote_version(&note.id, remote).await?;
    tracing::debug!("Adopted remote version of note {}", note.id);
    Ok(updated)
}

/// Build merged text from a line-by-line choice.
///
/// `selections` holds one flag per added or removed diff entry, in diff
/// order; `true` keeps the local line and `false` the remote one. Unchanged
/// lines are always kept. Changed entries past the end of `selections` are
/// left out of the result.
pub fn manual_merge(local: &str, remote: &str, selections: &[bool]) -> String {
    let mut choices = selections.iter().copied();
    let mut merged = Vec::new();

    for entry in generate_diff(local, remote) {
        let keep = match entry.kind {
            DiffKind::Unchanged => true,
            DiffKind::Removed => choices.next().unwrap_or(false),
            DiffKind::Added => choices.next().is_some_and(|use_local| !use_local),
        };
        if keep {
            merged.push(entry.line);
        }
    }

    merged.join("\n")
}
