use std::path::Path;

use crate::commands::common::{
    format_sync_timestamp, normalize_note_identifier, open_store, resolve_note,
};
use crate::error::CliError;

pub async fn run_show(id: &str, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let store = open_store(db_path).await?;
    let note = resolve_note(&normalized_id, &store).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&note)?);
        return Ok(());
    }

    println!("# {}", note.title);
    println!(
        "id: {}  kind: {}  status: {}",
        note.id,
        note.kind.as_str(),
        note.sync_status
    );
    println!("path: {}", note.path);
    if let Some(synced_at) = note.last_synced_at {
        println!("last synced: {}", format_sync_timestamp(synced_at));
    }
    println!();
    println!("{}", note.content);
    Ok(())
}
