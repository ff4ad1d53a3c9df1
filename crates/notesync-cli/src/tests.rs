use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use notesync_core::models::SyncStatusCounts;
use notesync_core::services::LocalStore;
use notesync_core::sync::{SyncAction, SyncReport, SyncResult};
use notesync_core::{Folder, Note, NoteKind, RepositorySyncConfig, SyncStatus};

use crate::commands::add::run_add;
use crate::commands::common::{
    default_editor, default_folder, format_note_lines, format_relative_time,
    format_sync_timestamp, normalize_content, normalize_note_body, normalize_note_identifier,
    note_preview, resolve_db_path, resolve_folder, resolve_note, DEFAULT_FOLDER_NAME,
};
use crate::commands::config::{redact_token, render_sync_config, run_config_set_repo, SetRepoArgs};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::folder::run_folder_delete;
use crate::commands::sync::{format_status_counts, format_sync_report, format_sync_result, run_sync};
use crate::error::CliError;

#[test]
fn normalize_content_trims_and_rejects_empty() {
    assert_eq!(normalize_content("  hello  "), Some("hello".to_string()));
    assert_eq!(normalize_content(" \n\t "), None);
}

#[test]
fn normalize_content_keeps_multiline_text() {
    assert_eq!(
        normalize_content("line 1\nline 2\n"),
        Some("line 1\nline 2".to_string())
    );
}

#[test]
fn normalize_note_body_keeps_indentation_and_inner_whitespace() {
    assert_eq!(
        normalize_note_body("    let x = 1;\n  - item\n\n"),
        Some("    let x = 1;\n  - item\n".to_string())
    );
    assert_eq!(normalize_note_body("  # Title  \r\n"), Some("  # Title  ".to_string()));
    assert_eq!(normalize_note_body("no newline"), Some("no newline".to_string()));
    assert_eq!(normalize_note_body(" \n\t "), None);
}

#[test]
fn default_editor_is_defined() {
    assert!(!default_editor().is_empty());
}

#[test]
fn format_relative_time_units() {
    let now = 10_000_000;
    assert_eq!(format_relative_time(now - 30_000, now), "just now");
    assert_eq!(format_relative_time(now - 120_000, now), "2m ago");
    assert_eq!(format_relative_time(now - 2 * 60 * 60_000, now), "2h ago");
}

#[test]
fn format_sync_timestamp_returns_utc_label() {
    assert_eq!(format_sync_timestamp(0), "1970-01-01 00:00:00 UTC");
}

#[test]
fn note_preview_truncates_with_ellipsis() {
    let mut note = Note::new(NoteKind::Text, Folder::new("Inbox").id, None);
    note.content = "This is a very long sentence that should be shortened\nsecond".to_string();
    assert_eq!(note_preview(&note, 20), "This is a very lo...");
}

#[test]
fn note_lines_show_title_and_status() {
    let note = Note::new(NoteKind::Drawing, Folder::new("Sketches").id, None);
    let lines = format_note_lines(&[note]);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("Untitled Drawing"));
    assert!(lines[0].contains("pending"));
}

#[test]
fn normalize_note_identifier_rejects_empty() {
    assert!(matches!(
        normalize_note_identifier(" \n "),
        Err(CliError::EmptyNoteId)
    ));
    assert_eq!(
        normalize_note_identifier("  abc123  ").unwrap(),
        "abc123".to_string()
    );
}

#[test]
fn resolve_db_path_prefers_explicit_flag() {
    let explicit = PathBuf::from("/tmp/explicit.db");
    assert_eq!(resolve_db_path(Some(explicit.clone())), explicit);
}

#[test]
fn redact_token_keeps_only_tail() {
    assert_eq!(redact_token("ghp_abcdefghijkl1234"), "****1234");
    assert_eq!(redact_token("short"), "****");
}

#[test]
fn render_sync_config_never_prints_token() {
    let config = RepositorySyncConfig::new("octo", "notes", "ghp_supersecret9876").with_base_path("");
    let rendered = render_sync_config(&config).join("\n");
    assert!(rendered.contains("octo/notes"));
    assert!(rendered.contains("base path:  /"));
    assert!(!rendered.contains("supersecret"));
}

#[test]
fn sync_output_formatting() {
    let counts = SyncStatusCounts {
        pending: 1,
        synced: 2,
        conflicts: 0,
        errors: 3,
        total: 6,
    };
    assert_eq!(
        format_status_counts(&counts),
        "pending: 1  synced: 2  conflicts: 0  errors: 3  total: 6"
    );

    assert_eq!(
        format_sync_report(&SyncReport::default()),
        vec!["Nothing to sync.".to_string()]
    );

    let result = SyncResult {
        note_id: "11111111-1111-7111-8111-111111111111".parse().unwrap(),
        action: SyncAction::Conflict,
        message: "Remote version is newer and content differs".to_string(),
        conflict: None,
    };
    let line = format_sync_result(&result);
    assert!(line.starts_with("11111111-1111"));
    assert!(line.contains("CONFLICT"));

    let report = SyncReport {
        results: vec![result],
    };
    let lines = format_sync_report(&report);
    assert!(lines.iter().any(|line| line.contains("1 conflicts")));
    assert!(lines.last().unwrap().contains("sync resolve"));
}

async fn seed_note(store: &LocalStore, folder: &Folder, id: &str, title: &str) -> Note {
    let mut note = Note::new(NoteKind::Text, folder.id, Some(title));
    note.id = id.parse().unwrap();
    note.content = format!("{title} body");
    store.put_note(&note).await.unwrap();
    note
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_note_supports_exact_and_prefix_id() {
    let store = LocalStore::open_in_memory().await.unwrap();
    let folder = store.create_folder("Inbox").await.unwrap();
    seed_note(&store, &folder, "11111111-1111-7111-8111-111111111111", "Note A").await;
    seed_note(&store, &folder, "11111111-1111-7111-8111-222222222222", "Note B").await;

    let by_exact = resolve_note("11111111-1111-7111-8111-111111111111", &store)
        .await
        .unwrap();
    assert_eq!(by_exact.title, "Note A");

    let by_prefix = resolve_note("11111111-1111-7111-8111-2", &store)
        .await
        .unwrap();
    assert_eq!(by_prefix.title, "Note B");
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_note_rejects_ambiguous_and_missing() {
    let store = LocalStore::open_in_memory().await.unwrap();
    let folder = store.create_folder("Inbox").await.unwrap();
    seed_note(&store, &folder, "aaaaaaaa-aaaa-7aaa-8aaa-aaaaaaaaaaaa", "Left").await;
    seed_note(&store, &folder, "aaaaaaaa-aaaa-7aaa-8aaa-bbbbbbbbbbbb", "Right").await;

    let error = resolve_note("aaaaaaaa-aaaa-7aaa-8aaa", &store)
        .await
        .unwrap_err();
    assert!(matches!(error, CliError::AmbiguousNoteId(_)));

    let error = resolve_note("does-not-exist", &store).await.unwrap_err();
    assert!(matches!(error, CliError::NoteNotFound(_)));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_note_does_not_treat_wildcards_as_prefixes() {
    let store = LocalStore::open_in_memory().await.unwrap();
    let folder = store.create_folder("Inbox").await.unwrap();
    seed_note(&store, &folder, "cccccccc-cccc-7ccc-8ccc-cccccccccccc", "Only").await;

    for query in ["%", "_", "%-%", "c%", "cccc____"] {
        let error = resolve_note(query, &store).await.unwrap_err();
        assert!(
            matches!(error, CliError::NoteNotFound(_)),
            "{query:?} resolved to a note"
        );
    }

    let note = resolve_note("cccc", &store).await.unwrap();
    assert_eq!(note.title, "Only");
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn resolve_folder_matches_name_then_id_prefix() {
    let store = LocalStore::open_in_memory().await.unwrap();
    let work = store.create_folder("Work").await.unwrap();

    assert_eq!(resolve_folder("work", &store).await.unwrap().id, work.id);
    let prefix = work.id.to_string()[..12].to_string();
    assert_eq!(resolve_folder(&prefix, &store).await.unwrap().id, work.id);
    assert!(matches!(
        resolve_folder("Personal", &store).await,
        Err(CliError::FolderNotFound(_))
    ));
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn default_folder_is_created_once() {
    let store = LocalStore::open_in_memory().await.unwrap();
    let first = default_folder(&store).await.unwrap();
    let second = default_folder(&store).await.unwrap();
    assert_eq!(first, second);

    let folders = store.list_folders().await.unwrap();
    assert_eq!(folders.len(), 1);
    assert_eq!(folders[0].name, DEFAULT_FOLDER_NAME);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn add_edit_and_delete_round_trip_on_disk() {
    let db_path = unique_test_db_path();

    run_add(
        &["Buy".to_string(), "milk".to_string()],
        Some("Groceries"),
        None,
        NoteKind::Text,
        &db_path,
    )
    .await
    .unwrap();

    let store = LocalStore::open_path(&db_path).await.unwrap();
    let notes = store.list_notes(&Default::default()).await.unwrap();
    assert_eq!(notes.len(), 1);
    let note = notes[0].clone();
    assert_eq!(note.title, "Groceries");
    assert_eq!(note.content, "Buy milk");
    assert!(note.path.starts_with("groceries-"));
    drop(store);

    let prefix = note.id.to_string()[..20].to_string();
    run_edit(&prefix, Some("Buy oat milk"), Some("Shopping"), &db_path)
        .await
        .unwrap();

    let store = LocalStore::open_path(&db_path).await.unwrap();
    let edited = store.get_note(&note.id).await.unwrap().unwrap();
    assert_eq!(edited.title, "Shopping");
    assert_eq!(edited.content, "Buy oat milk");
    assert_eq!(edited.sync_status, SyncStatus::Pending);
    drop(store);

    run_delete(&note.id.to_string(), &db_path).await.unwrap();
    let store = LocalStore::open_path(&db_path).await.unwrap();
    assert!(store.get_note(&note.id).await.unwrap().is_none());
    drop(store);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn add_keeps_leading_indentation() {
    let db_path = unique_test_db_path();

    run_add(&["    indented code".to_string()], None, None, NoteKind::Text, &db_path)
        .await
        .unwrap();

    let store = LocalStore::open_path(&db_path).await.unwrap();
    let notes = store.list_notes(&Default::default()).await.unwrap();
    assert_eq!(notes[0].content, "    indented code");
    drop(store);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn folder_delete_removes_its_notes() {
    let db_path = unique_test_db_path();
    {
        let store = LocalStore::open_path(&db_path).await.unwrap();
        let folder = store.create_folder("Scratch").await.unwrap();
        store
            .create_note(NoteKind::Drawing, &folder.id, None)
            .await
            .unwrap();
    }

    run_folder_delete("scratch", &db_path).await.unwrap();

    let store = LocalStore::open_path(&db_path).await.unwrap();
    assert!(store.list_folders().await.unwrap().is_empty());
    assert_eq!(store.sync_status_counts().await.unwrap().total, 0);
    drop(store);

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn sync_requires_repository_configuration() {
    let db_path = unique_test_db_path();

    let error = run_sync(&db_path).await.unwrap_err();
    assert!(matches!(error, CliError::SyncNotConfigured));

    cleanup_db_files(&db_path);
}

#[cfg_attr(windows, ignore = "libsql integration is flaky on windows CI")]
#[tokio::test(flavor = "current_thread")]
async fn set_repo_stores_normalized_config_and_token() {
    let db_path = unique_test_db_path();

    let args = SetRepoArgs {
        owner: " octo ",
        repo: "notes",
        branch: "main",
        base_path: "/vault/",
        token: Some("ghp_explicit".to_string()),
    };
    run_config_set_repo(args, &db_path).await.unwrap();

    let store = LocalStore::open_path(&db_path).await.unwrap();
    let config = store.load_sync_config().await.unwrap().unwrap();
    assert_eq!(config.owner, "octo");
    assert_eq!(config.base_path, "vault");
    assert_eq!(config.token, "ghp_explicit");
    assert_eq!(
        store.load_auth_token().await.unwrap().as_deref(),
        Some("ghp_explicit")
    );
    drop(store);

    cleanup_db_files(&db_path);
}

fn unique_test_db_path() -> PathBuf {
    static NEXT_TEST_DB_ID: AtomicU64 = AtomicU64::new(0);

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    let sequence = NEXT_TEST_DB_ID.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("notesync-cli-test-{timestamp}-{sequence}.db"))
}

fn cleanup_db_files(path: &PathBuf) {
    // libsql on Windows can hold file handles briefly after drop
    if cfg!(windows) {
        return;
    }

    let _ = std::fs::remove_file(path);
    let _ = std::fs::remove_file(path.with_extension("db-shm"));
    let _ = std::fs::remove_file(path.with_extension("db-wal"));
}
