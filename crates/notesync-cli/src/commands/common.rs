use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use notesync_core::models::{RemoteFileState, RepositorySyncConfig};
use notesync_core::services::LocalStore;
use notesync_core::sync::{GitHubConnector, RemoteConnector, RemoteFileStore, SyncEngine};
use notesync_core::{Folder, FolderId, Note, NoteId};
use serde::Serialize;

use crate::error::CliError;

pub const DEFAULT_FOLDER_NAME: &str = "Inbox";
pub const TOKEN_ENV: &str = "NOTESYNC_GITHUB_TOKEN";

#[derive(Debug, Serialize)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub kind: String,
    pub folder_id: String,
    pub preview: String,
    pub path: String,
    pub sync_status: String,
    pub updated_at: i64,
    pub relative_time: String,
}

pub async fn open_store(db_path: &Path) -> Result<LocalStore, CliError> {
    Ok(LocalStore::open_path(db_path).await?)
}

pub fn open_engine(store: LocalStore) -> Result<SyncEngine<GitHubConnector>, CliError> {
    Ok(SyncEngine::new(store, GitHubConnector::from_env()?))
}

pub async fn require_sync_config(store: &LocalStore) -> Result<RepositorySyncConfig, CliError> {
    store
        .load_sync_config()
        .await?
        .ok_or(CliError::SyncNotConfigured)
}

/// Current remote version of `note`, if the file exists.
pub async fn fetch_remote_version(
    config: &RepositorySyncConfig,
    note: &Note,
) -> Result<Option<RemoteFileState>, CliError> {
    let client = GitHubConnector::from_env()?.connect(config)?;
    Ok(client.read_file(&config.remote_path(&note.path)).await?)
}

pub async fn resolve_note(note_query: &str, store: &LocalStore) -> Result<Note, CliError> {
    if let Ok(note_id) = note_query.parse::<NoteId>() {
        if let Some(note) = store.get_note(&note_id).await? {
            return Ok(note);
        }
    }

    if !is_id_prefix(note_query) {
        return Err(CliError::NoteNotFound(note_query.to_string()));
    }
    let matching_ids = store.list_note_ids_by_prefix(note_query, 3).await?;

    match matching_ids.len() {
        0 => Err(CliError::NoteNotFound(note_query.to_string())),
        1 => {
            let resolved_id = matching_ids[0]
                .parse::<NoteId>()
                .map_err(|_| CliError::NoteNotFound(note_query.to_string()))?;
            store
                .get_note(&resolved_id)
                .await?
                .ok_or_else(|| CliError::NoteNotFound(note_query.to_string()))
        }
        _ => {
            let options = matching_ids
                .iter()
                .map(|id| short_id(id))
                .collect::<Vec<_>>()
                .join(", ");

            Err(CliError::AmbiguousNoteId(format!(
                "ID prefix '{note_query}' is ambiguous; matches: {options}"
            )))
        }
    }
}

fn is_id_prefix(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

/// Find a folder by exact name (case-insensitive) or ID prefix.
pub async fn resolve_folder(query: &str, store: &LocalStore) -> Result<Folder, CliError> {
    let query = query.trim();
    let folders = store.list_folders().await?;

    if let Some(folder) = folders
        .iter()
        .find(|folder| folder.name.eq_ignore_ascii_case(query))
    {
        return Ok(folder.clone());
    }

    let mut matches = folders
        .into_iter()
        .filter(|folder| !query.is_empty() && folder.id.to_string().starts_with(query));

    match (matches.next(), matches.next()) {
        (Some(folder), None) => Ok(folder),
        (None, _) => Err(CliError::FolderNotFound(query.to_string())),
        (Some(_), Some(_)) => Err(CliError::AmbiguousFolder(format!(
            "Folder ID prefix '{query}' is ambiguous"
        ))),
    }
}

/// The folder new notes land in when none is given, created on first use.
pub async fn default_folder(store: &LocalStore) -> Result<FolderId, CliError> {
    match resolve_folder(DEFAULT_FOLDER_NAME, store).await {
        Ok(folder) => Ok(folder.id),
        Err(CliError::FolderNotFound(_)) => Ok(store.create_folder(DEFAULT_FOLDER_NAME).await?.id),
        Err(error) => Err(error),
    }
}

/// Token for `config set-repo`: flag, then environment, then stored token.
pub async fn resolve_token(
    explicit: Option<String>,
    store: &LocalStore,
) -> Result<String, CliError> {
    if let Some(token) = explicit.as_deref().and_then(normalize_content) {
        return Ok(token);
    }
    if let Some(token) = env::var(TOKEN_ENV).ok().as_deref().and_then(normalize_content) {
        return Ok(token);
    }
    store.load_auth_token().await?.ok_or(CliError::MissingToken)
}

pub fn short_id(id: &str) -> String {
    id.chars().take(13).collect()
}

pub fn format_note_lines(notes: &[Note]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    notes
        .iter()
        .map(|note| {
            let short_id = short_id(&note.id.to_string());
            let title = truncate(&note.title, 32);
            let relative_time = format_relative_time(note.updated_at, now_ms);
            format!(
                "{short_id:<13}  {title:<32}  {:<8}  {relative_time}",
                note.sync_status.as_str()
            )
        })
        .collect()
}

pub fn format_folder_lines(folders: &[Folder]) -> Vec<String> {
    folders
        .iter()
        .map(|folder| {
            format!(
                "{:<13}  {:<24}  {}",
                short_id(&folder.id.to_string()),
                truncate(&folder.name, 24),
                folder.remote_path
            )
        })
        .collect()
}

pub fn note_to_list_item(note: &Note) -> NoteListItem {
    let now_ms = Utc::now().timestamp_millis();

    NoteListItem {
        id: note.id.to_string(),
        title: note.title.clone(),
        kind: note.kind.as_str().to_string(),
        folder_id: note.folder_id.to_string(),
        preview: note_preview(note, 80),
        path: note.path.clone(),
        sync_status: note.sync_status.as_str().to_string(),
        updated_at: note.updated_at,
        relative_time: format_relative_time(note.updated_at, now_ms),
    }
}

pub fn note_preview(note: &Note, max_chars: usize) -> String {
    let first_line = note.content_preview(usize::MAX);
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate(&collapsed, max_chars)
}

fn truncate(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = value.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_sync_timestamp(timestamp_ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(timestamp_ms).map_or_else(
        || timestamp_ms.to_string(),
        |date_time| date_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;
    let month = 30 * day;
    let year = 365 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else if diff < month {
        format!("{}w ago", diff / week)
    } else if diff < year {
        format!("{}mo ago", diff / month)
    } else {
        format!("{}y ago", diff / year)
    }
}

/// Content from arguments, else piped stdin. Empty notes are allowed.
pub fn resolve_note_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_note_body(&content_parts.join(" ")) {
        return Ok(content);
    }
    Ok(read_piped_stdin()?.unwrap_or_default())
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Note text as typed, minus the one trailing newline editors and pipes add.
/// Blank input counts as no input.
pub fn normalize_note_body(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return None;
    }
    let body = content
        .strip_suffix("\r\n")
        .or_else(|| content.strip_suffix('\n'))
        .unwrap_or(content);
    Some(body.to_string())
}

pub fn normalize_note_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyNoteId)
    } else {
        Ok(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_note_body(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_note_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let note_content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_note_body(&note_content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    // EDITOR may carry arguments ("code --wait")
    let mut parts = editor.split_whitespace();
    let Some(program) = parts.next() else {
        return Err(CliError::EditorFailed("empty EDITOR command".into()));
    };

    let status = Command::new(program).args(parts).arg(file_path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::EditorFailed(format!(
            "`{editor}` exited with status {status}"
        )))
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_note_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("notesync-note-{}-{now}.md", std::process::id()))
}

pub fn resolve_db_path(cli_db_path: Option<PathBuf>) -> PathBuf {
    cli_db_path
        .or_else(|| env::var_os("NOTESYNC_DB_PATH").map(PathBuf::from))
        .unwrap_or_else(default_db_path)
}

pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notesync")
        .join("notesync.db")
}
