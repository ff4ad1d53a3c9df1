//! Note repository implementation

#![allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)] // SQLite uses i64 for LIMIT/COUNT

use crate::error::{Error, Result};
use crate::models::{Note, NoteId, RemoteFileState, SyncStatus, SyncStatusCounts};
use libsql::params::Params;
use libsql::{Connection, Row, Value};

use super::NoteFilter;

const NOTE_COLUMNS: &str = "id, title, kind, folder_id, content, thumbnail, canvas_background, \
     path, remote_hash, sync_status, last_synced_at, created_at, updated_at";

/// Trait for note storage operations (async)
#[allow(async_fn_in_trait)]
pub trait NoteRepository {
    /// Get a note by ID
    async fn get(&self, id: &NoteId) -> Result<Option<Note>>;

    /// List notes matching `filter`, most recently updated first
    async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>>;

    /// Insert or replace a note
    async fn put(&self, note: &Note) -> Result<()>;

    /// Delete a note; returns whether it existed
    async fn delete(&self, id: &NoteId) -> Result<bool>;

    /// Note counts grouped by sync status
    async fn count_by_status(&self) -> Result<SyncStatusCounts>;

    /// Record a confirmed push.
    ///
    /// The note only becomes `synced` if it was not edited since the pushed
    /// snapshot (`snapshot_updated_at`); otherwise only the new remote hash is
    /// stored and the note stays pending. Returns whether it became synced.
    async fn mark_synced(
        &self,
        id: &NoteId,
        remote_hash: &str,
        snapshot_updated_at: i64,
        synced_at: i64,
    ) -> Result<bool>;

    /// Change only the sync status
    async fn set_sync_status(&self, id: &NoteId, status: SyncStatus) -> Result<bool>;

    /// Overwrite content with a remote version and mark it synced
    async fn apply_remote(
        &self,
        id: &NoteId,
        remote: &RemoteFileState,
        synced_at: i64,
    ) -> Result<bool>;

    /// IDs starting with `prefix`, most recently updated first
    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>>;
}

/// libSQL implementation of `NoteRepository`
pub struct LibSqlNoteRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlNoteRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a note from a database row
    fn parse_note(row: &Row) -> Result<Note> {
        let id: String = row.get(0)?;
        let folder_id: String = row.get(3)?;
        let kind: String = row.get(2)?;
        let sync_status: String = row.get(9)?;

        Ok(Note {
            id: id
                .parse()
                .map_err(|_| Error::Database(format!("invalid note id '{id}'")))?,
            title: row.get(1)?,
            kind: kind.parse()?,
            folder_id: folder_id
                .parse()
                .map_err(|_| Error::Database(format!("invalid folder id '{folder_id}'")))?,
            content: row.get(4)?,
            thumbnail: optional_text(row, 5)?,
            canvas_background: optional_text(row, 6)?
                .map(|value| value.parse())
                .transpose()?,
            path: row.get(7)?,
            remote_hash: optional_text(row, 8)?,
            sync_status: sync_status.parse()?,
            last_synced_at: optional_integer(row, 10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    async fn collect_notes(&self, sql: &str, params: Params) -> Result<Vec<Note>> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next().await? {
            notes.push(Self::parse_note(&row)?);
        }
        Ok(notes)
    }
}

impl NoteRepository for LibSqlNoteRepository<'_> {
    async fn get(&self, id: &NoteId) -> Result<Option<Note>> {
        let sql = format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?");
        let mut notes = self
            .collect_notes(&sql, Params::Positional(vec![Value::Text(id.as_str())]))
            .await?;
        Ok(notes.pop())
    }

    async fn list(&self, filter: &NoteFilter) -> Result<Vec<Note>> {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        if let Some(folder_id) = &filter.folder_id {
            clauses.push("folder_id = ?");
            values.push(Value::Text(folder_id.as_str()));
        }
        if let Some(status) = filter.sync_status {
            clauses.push("sync_status = ?");
            values.push(Value::Text(status.as_str().to_string()));
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        // LIMIT -1 means no limit in SQLite
        values.push(Value::Integer(filter.limit.map_or(-1, |limit| limit as i64)));

        let sql = format!(
            "SELECT {NOTE_COLUMNS} FROM notes {where_clause} ORDER BY updated_at DESC LIMIT ?"
        );
        self.collect_notes(&sql, Params::Positional(values)).await
    }

    async fn put(&self, note: &Note) -> Result<()> {
        let values = vec![
            Value::Text(note.id.as_str()),
            Value::Text(note.title.clone()),
            Value::Text(note.kind.as_str().to_string()),
            Value::Text(note.folder_id.as_str()),
            Value::Text(note.content.clone()),
            text_or_null(note.thumbnail.as_deref()),
            text_or_null(note.canvas_background.map(|bg| bg.as_str())),
            Value::Text(note.path.clone()),
            text_or_null(note.remote_hash.as_deref()),
            Value::Text(note.sync_status.as_str().to_string()),
            note.last_synced_at.map_or(Value::Null, Value::Integer),
            Value::Integer(note.created_at),
            Value::Integer(note.updated_at),
        ];

        let sql = format!(
            "INSERT INTO notes ({NOTE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                kind = excluded.kind,
                folder_id = excluded.folder_id,
                content = excluded.content,
                thumbnail = excluded.thumbnail,
                canvas_background = excluded.canvas_background,
                path = excluded.path,
                remote_hash = excluded.remote_hash,
                sync_status = excluded.sync_status,
                last_synced_at = excluded.last_synced_at,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at"
        );
        self.conn.execute(&sql, Params::Positional(values)).await?;
        Ok(())
    }

    async fn delete(&self, id: &NoteId) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM notes WHERE id = ?", [id.as_str()])
            .await?;
        Ok(rows > 0)
    }

    async fn count_by_status(&self) -> Result<SyncStatusCounts> {
        let mut rows = self
            .conn
            .query(
                "SELECT sync_status, COUNT(*) FROM notes GROUP BY sync_status",
                (),
            )
            .await?;

        let mut counts = SyncStatusCounts::default();
        while let Some(row) = rows.next().await? {
            let status: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            counts.record(status.parse()?, count as usize);
        }
        Ok(counts)
    }

    async fn mark_synced(
        &self,
        id: &NoteId,
        remote_hash: &str,
        snapshot_updated_at: i64,
        synced_at: i64,
    ) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE notes
                 SET remote_hash = ?, sync_status = 'synced', last_synced_at = ?
                 WHERE id = ? AND updated_at = ?",
                libsql::params![remote_hash, synced_at, id.as_str(), snapshot_updated_at],
            )
            .await?;

        if rows > 0 {
            return Ok(true);
        }

        // Edited while the push was in flight: keep it pending against the new hash
        self.conn
            .execute(
                "UPDATE notes SET remote_hash = ? WHERE id = ?",
                libsql::params![remote_hash, id.as_str()],
            )
            .await?;
        Ok(false)
    }

    async fn set_sync_status(&self, id: &NoteId, status: SyncStatus) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE notes SET sync_status = ? WHERE id = ?",
                [status.as_str().to_string(), id.as_str()],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn apply_remote(
        &self,
        id: &NoteId,
        remote: &RemoteFileState,
        synced_at: i64,
    ) -> Result<bool> {
        let rows = self
            .conn
            .execute(
                "UPDATE notes
                 SET content = ?, updated_at = ?, remote_hash = ?,
                     sync_status = 'synced', last_synced_at = ?
                 WHERE id = ?",
                libsql::params![
                    remote.content.as_str(),
                    remote.modified_at,
                    remote.hash.as_str(),
                    synced_at,
                    id.as_str()
                ],
            )
            .await?;
        Ok(rows > 0)
    }

    async fn list_ids_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<String>> {
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let mut rows = self
            .conn
            .query(
                "SELECT id FROM notes WHERE substr(id, 1, length(?1)) = ?1 \
                 ORDER BY updated_at DESC LIMIT ?2",
                libsql::params![prefix, limit as i64],
            )
            .await?;

        let mut ids = Vec::new();
        while let Some(row) = rows.next().await? {
            ids.push(row.get::<String>(0)?);
        }
        Ok(ids)
    }
}

pub(super) fn text_or_null(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

pub(super) fn optional_text(row: &Row, idx: i32) -> Result<Option<String>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Text(text) => Ok(Some(text)),
        other => Err(Error::Database(format!(
            "expected text in column {idx}, found {other:?}"
        ))),
    }
}

fn optional_integer(row: &Row, idx: i32) -> Result<Option<i64>> {
    match row.get_value(idx)? {
        Value::Null => Ok(None),
        Value::Integer(value) => Ok(Some(value)),
        other => Err(Error::Database(format!(
            "expected integer in column {idx}, found {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, FolderRepository, LibSqlFolderRepository};
    use crate::models::{Folder, FolderId, NoteKind};
    use pretty_assertions::assert_eq;

    async fn setup() -> (Database, FolderId) {
        let db = Database::open_in_memory().await.unwrap();
        let folder = Folder::new("Inbox");
        LibSqlFolderRepository::new(db.connection())
            .put(&folder)
            .await
            .unwrap();
        (db, folder.id)
    }

    fn text_note(folder_id: FolderId, title: &str, content: &str) -> Note {
        let mut note = Note::new(NoteKind::Text, folder_id, Some(title));
        note.set_content(content);
        note
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_and_get_roundtrip() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let mut note = Note::new(NoteKind::Drawing, folder_id, Some("Sketch"));
        note.set_content(r#"{"objects":[]}"#);
        note.thumbnail = Some("data:image/png;base64,AAAA".to_string());
        repo.put(&note).await.unwrap();

        let fetched = repo.get(&note.id).await.unwrap().unwrap();
        assert_eq!(fetched, note);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_upserts_existing_note() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let mut note = text_note(folder_id, "Todo", "one");
        repo.put(&note).await.unwrap();
        note.set_content("two");
        repo.put(&note).await.unwrap();

        let fetched = repo.get(&note.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "two");
        assert_eq!(repo.list(&NoteFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_get_missing_returns_none() {
        let (db, _) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());
        assert!(repo.get(&NoteId::new()).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_filters_and_orders_by_update_time() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let mut older = text_note(folder_id, "Older", "a");
        older.updated_at = 1_000;
        let mut newer = text_note(folder_id, "Newer", "b");
        newer.updated_at = 2_000;
        let mut synced = text_note(folder_id, "Synced", "c");
        synced.sync_status = SyncStatus::Synced;
        synced.updated_at = 3_000;

        for note in [&older, &newer, &synced] {
            repo.put(note).await.unwrap();
        }

        let all = repo.list(&NoteFilter::default()).await.unwrap();
        let titles = all.iter().map(|n| n.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Synced", "Newer", "Older"]);

        let pending = repo
            .list(&NoteFilter::with_status(SyncStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let limited = repo
            .list(&NoteFilter {
                limit: Some(1),
                ..NoteFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].title, "Synced");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = text_note(folder_id, "Gone", "bye");
        repo.put(&note).await.unwrap();
        assert!(repo.delete(&note.id).await.unwrap());
        assert!(!repo.delete(&note.id).await.unwrap());
        assert!(repo.get(&note.id).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_mark_synced_requires_unchanged_snapshot() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = text_note(folder_id, "Draft", "v1");
        repo.put(&note).await.unwrap();

        assert!(repo
            .mark_synced(&note.id, "sha-1", note.updated_at, 42)
            .await
            .unwrap());
        let synced = repo.get(&note.id).await.unwrap().unwrap();
        assert_eq!(synced.sync_status, SyncStatus::Synced);
        assert_eq!(synced.remote_hash.as_deref(), Some("sha-1"));
        assert_eq!(synced.last_synced_at, Some(42));

        // Stale snapshot: hash is recorded, status untouched
        let mut edited = synced.clone();
        edited.set_content("v2");
        repo.put(&edited).await.unwrap();
        assert!(!repo
            .mark_synced(&note.id, "sha-2", note.updated_at, 43)
            .await
            .unwrap());
        let pending = repo.get(&note.id).await.unwrap().unwrap();
        assert_eq!(pending.sync_status, SyncStatus::Pending);
        assert_eq!(pending.remote_hash.as_deref(), Some("sha-2"));
        assert_eq!(pending.content, "v2");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_apply_remote_overwrites_content() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = text_note(folder_id, "Shared", "local");
        repo.put(&note).await.unwrap();

        let remote = RemoteFileState {
            content: "remote".to_string(),
            modified_at: 5_000,
            hash: "sha-r".to_string(),
        };
        assert!(repo.apply_remote(&note.id, &remote, 6_000).await.unwrap());

        let fetched = repo.get(&note.id).await.unwrap().unwrap();
        assert_eq!(fetched.content, "remote");
        assert_eq!(fetched.updated_at, 5_000);
        assert_eq!(fetched.remote_hash.as_deref(), Some("sha-r"));
        assert_eq!(fetched.sync_status, SyncStatus::Synced);
        assert_eq!(fetched.last_synced_at, Some(6_000));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_count_by_status() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        for (title, status) in [
            ("a", SyncStatus::Pending),
            ("b", SyncStatus::Pending),
            ("c", SyncStatus::Synced),
            ("d", SyncStatus::Conflict),
            ("e", SyncStatus::Error),
        ] {
            let mut note = text_note(folder_id, title, title);
            note.sync_status = status;
            repo.put(&note).await.unwrap();
        }

        let counts = repo.count_by_status().await.unwrap();
        assert_eq!(
            counts,
            SyncStatusCounts {
                pending: 2,
                synced: 1,
                conflicts: 1,
                errors: 1,
                total: 5,
            }
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_ids_by_prefix() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());

        let note = text_note(folder_id, "Prefixed", "x");
        repo.put(&note).await.unwrap();

        let id = note.id.to_string();
        let ids = repo.list_ids_by_prefix(&id[..8], 3).await.unwrap();
        assert_eq!(ids, vec![id]);
        assert!(repo.list_ids_by_prefix("zzzz", 3).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_ids_by_prefix_treats_wildcards_literally() {
        let (db, folder_id) = setup().await;
        let repo = LibSqlNoteRepository::new(db.connection());
        repo.put(&text_note(folder_id, "Only", "x")).await.unwrap();

        for pattern in ["", "%", "_", "%-%", "\\"] {
            assert!(
                repo.list_ids_by_prefix(pattern, 3).await.unwrap().is_empty(),
                "{pattern:?} matched a note"
            );
        }
    }
}
