//! Shared local store service used by the sync engine and clients.

use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};

use crate::db::{
    ConfigRepository, Database, FolderRepository, LibSqlConfigRepository, LibSqlFolderRepository,
    LibSqlNoteRepository, NoteFilter, NoteRepository,
};
use crate::models::{
    Folder, FolderId, Note, NoteId, NoteKind, RemoteFileState, RepositorySyncConfig, SyncStatus,
    SyncStatusCounts,
};
use crate::util::now_millis;
use crate::{Error, Result};

/// Config key holding the `RepositorySyncConfig`
pub const GITHUB_CONFIG_KEY: &str = "github";
/// Config key holding the signed-in user's access token
pub const AUTH_TOKEN_KEY: &str = "auth_token";

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification for UI layers that want live collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    NoteChanged(NoteId),
    NoteDeleted(NoteId),
    FolderChanged(FolderId),
    /// Folder removed together with its notes
    FolderDeleted(FolderId),
    ConfigChanged(String),
}

/// Thread-safe local store over a single libSQL connection.
///
/// Every operation holds the connection lock for its whole duration, so a
/// reader never observes a half-written record.
#[derive(Clone)]
pub struct LocalStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
    events: broadcast::Sender<StoreEvent>,
}

impl LocalStore {
    /// Open a store at the given filesystem path.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::debug!("Opening local store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self::from_database(db, Some(db_path)))
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db, None))
    }

    fn from_database(db: Database, db_path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            db: Arc::new(Mutex::new(db)),
            db_path,
            events,
        }
    }

    /// Filesystem location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Subscribe to collection changes.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    // ---------------------------------------------------------------------
    // Notes
    // ---------------------------------------------------------------------

    /// Create an empty note in an existing folder.
    pub async fn create_note(
        &self,
        kind: NoteKind,
        folder_id: &FolderId,
        title: Option<&str>,
    ) -> Result<Note> {
        let note = Note::new(kind, *folder_id, title);
        {
            let db = self.db.lock().await;
            if LibSqlFolderRepository::new(db.connection())
                .get(folder_id)
                .await?
                .is_none()
            {
                return Err(Error::NotFound(format!("folder {folder_id}")));
            }
            LibSqlNoteRepository::new(db.connection()).put(&note).await?;
        }
        self.emit(StoreEvent::NoteChanged(note.id));
        Ok(note)
    }

    /// Fetch a note by id.
    pub async fn get_note(&self, id: &NoteId) -> Result<Option<Note>> {
        let db = self.db.lock().await;
        LibSqlNoteRepository::new(db.connection()).get(id).await
    }

    /// List notes matching `filter`, most recently updated first.
    pub async fn list_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let db = self.db.lock().await;
        LibSqlNoteRepository::new(db.connection())
            .list(filter)
            .await
    }

    /// Upsert a full note record.
    pub async fn put_note(&self, note: &Note) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlNoteRepository::new(db.connection()).put(note).await?;
        }
        self.emit(StoreEvent::NoteChanged(note.id));
        Ok(())
    }

    /// Replace a note's body; the note becomes pending.
    pub async fn update_note_content(&self, id: &NoteId, content: &str) -> Result<Note> {
        self.modify_note(id, |note| note.set_content(content)).await
    }

    /// Retitle a note; the note becomes pending under a new remote path.
    pub async fn rename_note(&self, id: &NoteId, title: &str) -> Result<Note> {
        self.modify_note(id, |note| note.rename(title)).await
    }

    async fn modify_note(&self, id: &NoteId, change: impl FnOnce(&mut Note)) -> Result<Note> {
        let note = {
            let db = self.db.lock().await;
            let repo = LibSqlNoteRepository::new(db.connection());
            let mut note = repo
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            change(&mut note);
            repo.put(&note).await?;
            note
        };
        self.emit(StoreEvent::NoteChanged(note.id));
        Ok(note)
    }

    /// Delete a note.
    pub async fn delete_note(&self, id: &NoteId) -> Result<()> {
        let existed = {
            let db = self.db.lock().await;
            LibSqlNoteRepository::new(db.connection())
                .delete(id)
                .await?
        };
        if !existed {
            return Err(Error::NotFound(id.to_string()));
        }
        self.emit(StoreEvent::NoteDeleted(*id));
        Ok(())
    }

    /// Note ids starting with `prefix`.
    pub async fn list_note_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        LibSqlNoteRepository::new(db.connection())
            .list_ids_by_prefix(prefix, limit)
            .await
    }

    // ---------------------------------------------------------------------
    // Sync bookkeeping (status and hash fields only)
    // ---------------------------------------------------------------------

    /// Record a confirmed push; see [`NoteRepository::mark_synced`].
    pub async fn mark_synced(
        &self,
        id: &NoteId,
        remote_hash: &str,
        snapshot_updated_at: i64,
    ) -> Result<bool> {
        let synced = {
            let db = self.db.lock().await;
            LibSqlNoteRepository::new(db.connection())
                .mark_synced(id, remote_hash, snapshot_updated_at, now_millis())
                .await?
        };
        self.emit(StoreEvent::NoteChanged(*id));
        Ok(synced)
    }

    /// Set only the sync status of a note.
    pub async fn set_sync_status(&self, id: &NoteId, status: SyncStatus) -> Result<()> {
        let updated = {
            let db = self.db.lock().await;
            LibSqlNoteRepository::new(db.connection())
                .set_sync_status(id, status)
                .await?
        };
        if !updated {
            return Err(Error::NotFound(id.to_string()));
        }
        self.emit(StoreEvent::NoteChanged(*id));
        Ok(())
    }

    /// Adopt a remote version as the local content and mark the note synced.
    pub async fn apply_remote_version(
        &self,
        id: &NoteId,
        remote: &RemoteFileState,
    ) -> Result<Note> {
        let note = {
            let db = self.db.lock().await;
            let repo = LibSqlNoteRepository::new(db.connection());
            if !repo.apply_remote(id, remote, now_millis()).await? {
                return Err(Error::NotFound(id.to_string()));
            }
            repo.get(id)
                .await?
                .ok_or_else(|| Error::NotFound(id.to_string()))?
        };
        self.emit(StoreEvent::NoteChanged(note.id));
        Ok(note)
    }

    /// Note counts by sync status.
    pub async fn sync_status_counts(&self) -> Result<SyncStatusCounts> {
        let db = self.db.lock().await;
        LibSqlNoteRepository::new(db.connection())
            .count_by_status()
            .await
    }

    // ---------------------------------------------------------------------
    // Folders
    // ---------------------------------------------------------------------

    pub async fn create_folder(&self, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("folder name cannot be empty".into()));
        }

        let folder = Folder::new(name);
        {
            let db = self.db.lock().await;
            LibSqlFolderRepository::new(db.connection())
                .put(&folder)
                .await?;
        }
        self.emit(StoreEvent::FolderChanged(folder.id));
        Ok(folder)
    }

    pub async fn get_folder(&self, id: &FolderId) -> Result<Option<Folder>> {
        let db = self.db.lock().await;
        LibSqlFolderRepository::new(db.connection()).get(id).await
    }

    /// List folders, oldest first.
    pub async fn list_folders(&self) -> Result<Vec<Folder>> {
        let db = self.db.lock().await;
        LibSqlFolderRepository::new(db.connection()).list().await
    }

    pub async fn rename_folder(&self, id: &FolderId, name: &str) -> Result<Folder> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("folder name cannot be empty".into()));
        }

        let folder = {
            let db = self.db.lock().await;
            let repo = LibSqlFolderRepository::new(db.connection());
            let mut folder = repo
                .get(id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("folder {id}")))?;
            folder.rename(name);
            repo.put(&folder).await?;
            folder
        };
        self.emit(StoreEvent::FolderChanged(folder.id));
        Ok(folder)
    }

    /// Delete a folder and all of its notes. Returns the number of notes removed.
    pub async fn delete_folder(&self, id: &FolderId) -> Result<u64> {
        let removed = {
            let db = self.db.lock().await;
            LibSqlFolderRepository::new(db.connection())
                .delete(id)
                .await?
        };
        self.emit(StoreEvent::FolderDeleted(*id));
        Ok(removed)
    }

    // ---------------------------------------------------------------------
    // Config
    // ---------------------------------------------------------------------

    pub async fn get_config<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let db = self.db.lock().await;
        LibSqlConfigRepository::new(db.connection())
            .get_config(key)
            .await
    }

    pub async fn set_config<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<()> {
        {
            let db = self.db.lock().await;
            LibSqlConfigRepository::new(db.connection())
                .set_config(key, value)
                .await?;
        }
        self.emit(StoreEvent::ConfigChanged(key.to_string()));
        Ok(())
    }

    pub async fn delete_config(&self, key: &str) -> Result<bool> {
        let existed = {
            let db = self.db.lock().await;
            LibSqlConfigRepository::new(db.connection())
                .delete_config(key)
                .await?
        };
        if existed {
            self.emit(StoreEvent::ConfigChanged(key.to_string()));
        }
        Ok(existed)
    }

    /// Repository sync settings; `None` means sync is disabled.
    pub async fn load_sync_config(&self) -> Result<Option<RepositorySyncConfig>> {
        self.get_config(GITHUB_CONFIG_KEY).await
    }

    /// Validate and persist repository sync settings.
    pub async fn save_sync_config(&self, config: RepositorySyncConfig) -> Result<RepositorySyncConfig> {
        let config = config.normalized()?;
        self.set_config(GITHUB_CONFIG_KEY, &config).await?;
        tracing::info!("Sync enabled for {}", config.full_name());
        Ok(config)
    }

    pub async fn clear_sync_config(&self) -> Result<bool> {
        self.delete_config(GITHUB_CONFIG_KEY).await
    }

    pub async fn load_auth_token(&self) -> Result<Option<String>> {
        self.get_config(AUTH_TOKEN_KEY).await
    }

    pub async fn save_auth_token(&self, token: &str) -> Result<()> {
        self.set_config(AUTH_TOKEN_KEY, &token).await
    }

    pub async fn clear_auth_token(&self) -> Result<bool> {
        self.delete_config(AUTH_TOKEN_KEY).await
    }

    /// Remove every note, folder and config entry.
    pub async fn clear_all(&self) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();
        conn.execute("DELETE FROM notes", ()).await?;
        conn.execute("DELETE FROM folders", ()).await?;
        LibSqlConfigRepository::new(conn).clear().await?;
        tracing::warn!("Cleared all local notes, folders and config");
        Ok(())
    }
}
