//! Sync orchestration: pushes pending notes to the configured repository and
//! tracks per-note sync state.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;

use crate::db::NoteFilter;
use crate::models::{
    ConflictData, Note, NoteId, NoteKind, RemoteFileState, RepositoryRef, RepositorySyncConfig,
    SyncStatus, SyncStatusCounts,
};
use crate::services::LocalStore;
use crate::{Error, Result};

use super::conflict::{detect_conflict, resolve_keep_local, resolve_keep_remote, ConflictResult};
use super::remote::{RemoteConnector, RemoteError, RemoteFileStore};

const WRITE_CONFLICT_REASON: &str = "Remote file changed while pushing";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Pushed,
    Pulled,
    UpToDate,
    Conflict,
    Error,
}

/// Outcome of syncing a single note
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub note_id: NoteId,
    pub action: SyncAction,
    pub message: String,
    /// Present when `action` is `Conflict` and the remote version is known
    pub conflict: Option<ConflictData>,
}

impl SyncResult {
    fn new(note_id: NoteId, action: SyncAction, message: impl Into<String>) -> Self {
        Self {
            note_id,
            action,
            message: message.into(),
            conflict: None,
        }
    }

    fn conflict(note: &Note, remote: Option<RemoteFileState>, reason: &str) -> Self {
        Self {
            note_id: note.id,
            action: SyncAction::Conflict,
            message: reason.to_string(),
            conflict: remote.map(|remote| ConflictData {
                local_note: note.clone(),
                remote,
                reason: reason.to_string(),
            }),
        }
    }
}

/// Results of a full pass over pending notes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    fn count(&self, action: SyncAction) -> usize {
        self.results
            .iter()
            .filter(|result| result.action == action)
            .count()
    }

    pub fn pushed(&self) -> usize {
        self.count(SyncAction::Pushed)
    }

    pub fn up_to_date(&self) -> usize {
        self.count(SyncAction::UpToDate)
    }

    pub fn conflicts(&self) -> usize {
        self.count(SyncAction::Conflict)
    }

    pub fn failed(&self) -> usize {
        self.count(SyncAction::Error)
    }
}

/// Position inside a running batch; `total == 0` when idle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncProgress {
    pub current: usize,
    pub total: usize,
}

/// User choice for a reported conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictResolution {
    KeepLocal,
    KeepRemote,
    /// Merged text, usually from [`super::manual_merge`]
    Manual(String),
}

/// Drives note sync between the local store and a remote file store.
///
/// Only one operation runs at a time; starting another while one is in
/// flight fails with [`Error::SyncInProgress`].
pub struct SyncEngine<C: RemoteConnector> {
    store: LocalStore,
    connector: C,
    syncing: AtomicBool,
    progress: watch::Sender<SyncProgress>,
}

struct SyncGuard<'a>(&'a AtomicBool);

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<C: RemoteConnector> SyncEngine<C> {
    pub fn new(store: LocalStore, connector: C) -> Self {
        let (progress, _) = watch::channel(SyncProgress::default());
        Self {
            store,
            connector,
            syncing: AtomicBool::new(false),
            progress,
        }
    }

    pub const fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn is_syncing(&self) -> bool {
        self.syncing.load(Ordering::Acquire)
    }

    /// Watch batch progress.
    pub fn progress(&self) -> watch::Receiver<SyncProgress> {
        self.progress.subscribe()
    }

    fn begin(&self) -> Result<SyncGuard<'_>> {
        self.syncing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| Error::SyncInProgress)?;
        Ok(SyncGuard(&self.syncing))
    }

    async fn connect(&self) -> Result<Option<(RepositorySyncConfig, C::Store)>> {
        let Some(config) = self.store.load_sync_config().await? else {
            tracing::debug!("Sync disabled: no repository configured");
            return Ok(None);
        };
        let remote = self.connector.connect(&config)?;
        Ok(Some((config, remote)))
    }

    /// Push one note.
    ///
    /// Returns `Ok(None)` without touching anything when sync is not
    /// configured. Remote failures are reported in the result, not as `Err`.
    pub async fn push_note(&self, id: &NoteId) -> Result<Option<SyncResult>> {
        let _guard = self.begin()?;
        let Some((config, remote)) = self.connect().await? else {
            return Ok(None);
        };

        let note = self
            .store
            .get_note(id)
            .await?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        Ok(Some(self.sync_note(&remote, &config, note).await))
    }

    /// Push every pending note, one at a time.
    ///
    /// A failing note is recorded in the report and the pass moves on.
    pub async fn sync_all_pending(&self) -> Result<Option<SyncReport>> {
        let _guard = self.begin()?;
        let Some((config, remote)) = self.connect().await? else {
            return Ok(None);
        };

        let pending = self
            .store
            .list_notes(&NoteFilter::with_status(SyncStatus::Pending))
            .await?;
        let total = pending.len();
        self.progress.send_replace(SyncProgress { current: 0, total });
        tracing::info!("Syncing {} pending notes to {}", total, config.full_name());

        let mut report = SyncReport::default();
        for (idx, note) in pending.into_iter().enumerate() {
            self.progress.send_replace(SyncProgress {
                current: idx + 1,
                total,
            });
            report.results.push(self.sync_note(&remote, &config, note).await);
        }
        self.progress.send_replace(SyncProgress::default());

        tracing::info!(
            "Sync finished: {} pushed, {} up to date, {} conflicts, {} failed",
            report.pushed(),
            report.up_to_date(),
            report.conflicts(),
            report.failed()
        );
        Ok(Some(report))
    }

    /// Note counts by status, from the local store only.
    pub async fn get_sync_status(&self) -> Result<SyncStatusCounts> {
        self.store.sync_status_counts().await
    }

    /// Apply the user's choice for a conflict reported by an earlier push.
    pub async fn resolve_conflict(
        &self,
        conflict: &ConflictData,
        resolution: ConflictResolution,
    ) -> Result<Option<SyncResult>> {
        let _guard = self.begin()?;
        let Some((config, remote)) = self.connect().await? else {
            return Ok(None);
        };
        let id = conflict.local_note.id;

        let note = match resolution {
            ConflictResolution::KeepRemote => {
                resolve_keep_remote(&self.store, &conflict.local_note, &conflict.remote).await?;
                return Ok(Some(SyncResult::new(
                    id,
                    SyncAction::Pulled,
                    "Kept remote version",
                )));
            }
            ConflictResolution::KeepLocal => {
                resolve_keep_local(&self.store, &conflict.local_note).await?;
                self.store
                    .get_note(&id)
                    .await?
                    .ok_or_else(|| Error::NotFound(id.to_string()))?
            }
            ConflictResolution::Manual(merged) => {
                self.store.update_note_content(&id, &merged).await?
            }
        };

        let path = config.remote_path(&note.path);
        let outcome = self
            .write_and_record(&remote, &path, &note, Some(&conflict.remote.hash))
            .await;
        Ok(Some(self.settle(&remote, &path, &note, outcome).await))
    }

    /// Repositories visible to the configured token; `None` without config.
    pub async fn list_repositories(&self) -> Result<Option<Vec<RepositoryRef>>> {
        let Some((_, remote)) = self.connect().await? else {
            return Ok(None);
        };
        Ok(Some(remote.list_repositories().await?))
    }

    async fn sync_note(
        &self,
        remote: &C::Store,
        config: &RepositorySyncConfig,
        note: Note,
    ) -> SyncResult {
        let path = config.remote_path(&note.path);
        tracing::debug!("Syncing note {} to {}", note.id, path);
        let outcome = self.try_push(remote, &path, &note).await;
        self.settle(remote, &path, &note, outcome).await
    }

    async fn try_push(&self, remote: &C::Store, path: &str, note: &Note) -> Result<SyncResult> {
        let Some(current) = remote.read_file(path).await? else {
            return self.write_and_record(remote, path, note, None).await;
        };
        check_remote_content(note, &current)?;

        if let ConflictResult::RemoteNewer { reason } = detect_conflict(note, &current) {
            self.store
                .set_sync_status(&note.id, SyncStatus::Conflict)
                .await?;
            tracing::info!("Conflict on note {}: {}", note.id, reason);
            return Ok(SyncResult::conflict(note, Some(current), &reason));
        }

        if note.content == current.content {
            self.store
                .mark_synced(&note.id, &current.hash, note.updated_at)
                .await?;
            return Ok(SyncResult::new(
                note.id,
                SyncAction::UpToDate,
                "Remote already has this content",
            ));
        }

        self.write_and_record(remote, path, note, Some(&current.hash))
            .await
    }

    // The local record changes only after the remote confirmed the write.
    async fn write_and_record(
        &self,
        remote: &C::Store,
        path: &str,
        note: &Note,
        known_hash: Option<&str>,
    ) -> Result<SyncResult> {
        let hash = remote.write_file(path, &note.content, known_hash).await?;
        let clean = self
            .store
            .mark_synced(&note.id, &hash, note.updated_at)
            .await?;

        let message = if clean {
            format!("Pushed to {path}")
        } else {
            format!("Pushed to {path}; newer local edits remain pending")
        };
        Ok(SyncResult::new(note.id, SyncAction::Pushed, message))
    }

    /// Turn a failed attempt into a recorded status.
    async fn settle(
        &self,
        remote: &C::Store,
        path: &str,
        note: &Note,
        outcome: Result<SyncResult>,
    ) -> SyncResult {
        let error = match outcome {
            Ok(result) => return result,
            Err(error) => error,
        };

        if let Error::Remote(RemoteError::Conflict(detail)) = &error {
            tracing::info!("Remote rejected push of note {}: {}", note.id, detail);
            let current = remote.read_file(path).await.ok().flatten();
            if let Err(e) = self
                .store
                .set_sync_status(&note.id, SyncStatus::Conflict)
                .await
            {
                tracing::warn!("Failed to mark note {} as conflicted: {}", note.id, e);
            }
            return SyncResult::conflict(note, current, WRITE_CONFLICT_REASON);
        }

        tracing::warn!("Failed to sync note {}: {}", note.id, error);
        if let Err(e) = self
            .store
            .set_sync_status(&note.id, SyncStatus::Error)
            .await
        {
            tracing::warn!("Failed to mark note {} as errored: {}", note.id, e);
        }
        SyncResult::new(note.id, SyncAction::Error, error.to_string())
    }
}

// Drawings are stored as scene JSON; anything else cannot be merged or shown.
fn check_remote_content(note: &Note, remote: &RemoteFileState) -> Result<()> {
    if note.kind == NoteKind::Drawing && !remote.content.trim().is_empty() {
        serde_json::from_str::<serde_json::Value>(&remote.content).map_err(|e| {
            RemoteError::Malformed(format!("drawing at remote is not valid JSON: {e}"))
        })?;
    }
    Ok(())
}
