//! Note model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::FolderId;
use crate::error::Error;
use crate::util::{now_millis, slugify};

/// A unique identifier for a note, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NoteId(Uuid);

impl NoteId {
    /// Create a new unique note ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for NoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NoteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// What the note body holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    /// Markdown/HTML text
    #[default]
    Text,
    /// Serialized drawing scene (JSON)
    Drawing,
}

impl NoteKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Drawing => "drawing",
        }
    }

    const fn default_title(self) -> &'static str {
        match self {
            Self::Text => "Untitled Note",
            Self::Drawing => "Untitled Drawing",
        }
    }
}

impl FromStr for NoteKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "drawing" => Ok(Self::Drawing),
            other => Err(Error::InvalidInput(format!("unknown note kind '{other}'"))),
        }
    }
}

/// Paper style behind a drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CanvasBackground {
    #[default]
    Blank,
    Lined,
    Grid,
    Dotted,
}

impl CanvasBackground {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Lined => "lined",
            Self::Grid => "grid",
            Self::Dotted => "dotted",
        }
    }
}

impl FromStr for CanvasBackground {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blank" => Ok(Self::Blank),
            "lined" => Ok(Self::Lined),
            "grid" => Ok(Self::Grid),
            "dotted" => Ok(Self::Dotted),
            other => Err(Error::InvalidInput(format!(
                "unknown canvas background '{other}'"
            ))),
        }
    }
}

/// Where a note stands relative to its remote file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Local changes not yet pushed
    #[default]
    Pending,
    /// Local and remote agree on `remote_hash`
    Synced,
    /// Remote changed concurrently; waiting for a resolution
    Conflict,
    /// Last sync attempt failed
    Error,
}

impl SyncStatus {
    pub const ALL: [Self; 4] = [Self::Pending, Self::Synced, Self::Conflict, Self::Error];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Synced => "synced",
            Self::Conflict => "conflict",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "synced" => Ok(Self::Synced),
            "conflict" => Ok(Self::Conflict),
            "error" => Ok(Self::Error),
            other => Err(Error::InvalidInput(format!("unknown sync status '{other}'"))),
        }
    }
}

/// A note in the local store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: NoteId,
    pub title: String,
    pub kind: NoteKind,
    /// Owning folder
    pub folder_id: FolderId,
    /// Markdown/HTML for text notes, scene JSON for drawings
    pub content: String,
    /// Optional preview image, already encoded as text
    pub thumbnail: Option<String>,
    pub canvas_background: Option<CanvasBackground>,
    /// File path relative to the repository base path
    pub path: String,
    /// Blob SHA of the remote file as of the last push or pull
    pub remote_hash: Option<String>,
    pub sync_status: SyncStatus,
    /// Last successful sync (Unix ms)
    pub last_synced_at: Option<i64>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Note {
    /// Create an empty, unsynced note in `folder_id`
    ///
    /// Without a title the kind's default ("Untitled Note"/"Untitled Drawing")
    /// is used.
    #[must_use]
    pub fn new(kind: NoteKind, folder_id: FolderId, title: Option<&str>) -> Self {
        let now = now_millis();
        let id = NoteId::new();
        let title = title
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .unwrap_or_else(|| kind.default_title())
            .to_string();

        Self {
            path: note_path(&title, &id),
            id,
            title,
            kind,
            folder_id,
            content: String::new(),
            thumbnail: None,
            canvas_background: match kind {
                NoteKind::Drawing => Some(CanvasBackground::Blank),
                NoteKind::Text => None,
            },
            remote_hash: None,
            sync_status: SyncStatus::Pending,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the body. Any local edit makes the note pending again.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.touch();
    }

    /// Rename the note; it moves to a new remote file.
    pub fn rename(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.path = note_path(&self.title, &self.id);
        self.remote_hash = None;
        self.touch();
    }

    // updated_at must strictly increase so an in-flight push can tell the note
    // was edited underneath it
    fn touch(&mut self) {
        self.updated_at = now_millis().max(self.updated_at + 1);
        self.sync_status = SyncStatus::Pending;
    }

    /// Get first line as title preview, truncated to `max_len` characters
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

fn note_path(title: &str, id: &NoteId) -> String {
    format!("{}-{id}.md", slugify(title))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_id_unique() {
        let id1 = NoteId::new();
        let id2 = NoteId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_note_id_parse() {
        let id = NoteId::new();
        let parsed: NoteId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_note_new_defaults() {
        let folder = FolderId::new();
        let note = Note::new(NoteKind::Text, folder, None);
        assert_eq!(note.title, "Untitled Note");
        assert_eq!(note.folder_id, folder);
        assert_eq!(note.sync_status, SyncStatus::Pending);
        assert!(note.content.is_empty());
        assert!(note.canvas_background.is_none());
        assert!(note.path.starts_with("untitled-note-"));
        assert!(note.path.ends_with(".md"));
        assert_eq!(note.created_at, note.updated_at);
    }

    #[test]
    fn test_drawing_defaults_to_blank_canvas() {
        let note = Note::new(NoteKind::Drawing, FolderId::new(), Some("  "));
        assert_eq!(note.title, "Untitled Drawing");
        assert_eq!(note.canvas_background, Some(CanvasBackground::Blank));
    }

    #[test]
    fn test_set_content_resets_sync_status() {
        let mut note = Note::new(NoteKind::Text, FolderId::new(), Some("Ideas"));
        note.sync_status = SyncStatus::Synced;
        note.remote_hash = Some("abc".to_string());

        note.set_content("new body");

        assert_eq!(note.content, "new body");
        assert_eq!(note.sync_status, SyncStatus::Pending);
        assert_eq!(note.remote_hash.as_deref(), Some("abc"));
    }

    #[test]
    fn test_rename_moves_remote_path() {
        let mut note = Note::new(NoteKind::Text, FolderId::new(), Some("Ideas"));
        note.sync_status = SyncStatus::Synced;
        note.remote_hash = Some("abc".to_string());
        let old_path = note.path.clone();

        note.rename("Better Ideas");

        assert_ne!(note.path, old_path);
        assert!(note.path.starts_with("better-ideas-"));
        assert!(note.remote_hash.is_none());
        assert_eq!(note.sync_status, SyncStatus::Pending);
    }

    #[test]
    fn test_sync_status_parse() {
        for status in SyncStatus::ALL {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_content_preview() {
        let mut note = Note::new(NoteKind::Text, FolderId::new(), None);
        note.set_content("First line\nSecond line");
        assert_eq!(note.content_preview(50), "First line");
        assert_eq!(note.content_preview(5), "First");
    }
}
