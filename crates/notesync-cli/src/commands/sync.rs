use std::path::Path;

use notesync_core::models::SyncStatusCounts;
use notesync_core::sync::{
    diff_stats, format_diff, generate_diff, ConflictResolution, SyncAction, SyncReport,
    SyncResult,
};
use notesync_core::ConflictData;

use crate::cli::KeepSide;
use crate::commands::common::{
    fetch_remote_version, normalize_note_identifier, open_engine, open_store,
    require_sync_config, resolve_note, short_id,
};
use crate::error::CliError;

pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let engine = open_engine(open_store(db_path).await?)?;
    let Some(report) = engine.sync_all_pending().await? else {
        return Err(CliError::SyncNotConfigured);
    };

    for line in format_sync_report(&report) {
        println!("{line}");
    }
    Ok(())
}

pub async fn run_sync_push(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let store = open_store(db_path).await?;
    let note = resolve_note(&normalized_id, &store).await?;
    let engine = open_engine(store)?;

    let Some(result) = engine.push_note(&note.id).await? else {
        return Err(CliError::SyncNotConfigured);
    };
    println!("{}", format_sync_result(&result));
    Ok(())
}

pub async fn run_sync_status(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let engine = open_engine(open_store(db_path).await?)?;
    let counts = engine.get_sync_status().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("{}", format_status_counts(&counts));
    }
    Ok(())
}

pub async fn run_sync_diff(id: &str, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let store = open_store(db_path).await?;
    let config = require_sync_config(&store).await?;
    let note = resolve_note(&normalized_id, &store).await?;

    let Some(remote) = fetch_remote_version(&config, &note).await? else {
        return Err(CliError::NoRemoteVersion(note.id.to_string()));
    };

    let diff = generate_diff(&note.content, &remote.content);
    let stats = diff_stats(&diff);
    println!("--- local  {}", note.path);
    println!("+++ remote {}", config.remote_path(&note.path));
    println!("{}", format_diff(&diff));
    println!(
        "{} added, {} removed, {} unchanged",
        stats.added, stats.removed, stats.unchanged
    );
    Ok(())
}

pub async fn run_sync_resolve(id: &str, keep: KeepSide, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let store = open_store(db_path).await?;
    let config = require_sync_config(&store).await?;
    let note = resolve_note(&normalized_id, &store).await?;

    let Some(remote) = fetch_remote_version(&config, &note).await? else {
        return Err(CliError::NoRemoteVersion(note.id.to_string()));
    };
    let conflict = ConflictData {
        local_note: note,
        remote,
        reason: "Resolved from the command line".to_string(),
    };
    let resolution = match keep {
        KeepSide::Local => ConflictResolution::KeepLocal,
        KeepSide::Remote => ConflictResolution::KeepRemote,
    };

    let engine = open_engine(store)?;
    let Some(result) = engine.resolve_conflict(&conflict, resolution).await? else {
        return Err(CliError::SyncNotConfigured);
    };
    println!("{}", format_sync_result(&result));
    Ok(())
}

pub fn format_sync_result(result: &SyncResult) -> String {
    let label = match result.action {
        SyncAction::Pushed => "pushed",
        SyncAction::Pulled => "pulled",
        SyncAction::UpToDate => "up-to-date",
        SyncAction::Conflict => "CONFLICT",
        SyncAction::Error => "ERROR",
    };
    format!(
        "{:<13}  {label:<10}  {}",
        short_id(&result.note_id.to_string()),
        result.message
    )
}

pub fn format_sync_report(report: &SyncReport) -> Vec<String> {
    if report.results.is_empty() {
        return vec!["Nothing to sync.".to_string()];
    }

    let mut lines = report
        .results
        .iter()
        .map(format_sync_result)
        .collect::<Vec<_>>();
    lines.push(format!(
        "{} pushed, {} up to date, {} conflicts, {} failed",
        report.pushed(),
        report.up_to_date(),
        report.conflicts(),
        report.failed()
    ));
    if report.conflicts() > 0 {
        lines.push(
            "Resolve conflicts with `notesync sync resolve <id> --keep local|remote`".to_string(),
        );
    }
    lines
}

pub fn format_status_counts(counts: &SyncStatusCounts) -> String {
    format!(
        "pending: {}  synced: {}  conflicts: {}  errors: {}  total: {}",
        counts.pending, counts.synced, counts.conflicts, counts.errors, counts.total
    )
}
