use std::path::Path;

use notesync_core::db::NoteFilter;
use notesync_core::SyncStatus;

use crate::commands::common::{
    format_note_lines, note_to_list_item, open_store, resolve_folder, NoteListItem,
};
use crate::error::CliError;

pub async fn run_list(
    folder: Option<&str>,
    status: Option<SyncStatus>,
    limit: usize,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let folder_id = match folder {
        Some(query) => Some(resolve_folder(query, &store).await?.id),
        None => None,
    };

    let filter = NoteFilter {
        folder_id,
        sync_status: status,
        limit: Some(limit),
    };
    let notes = store.list_notes(&filter).await?;

    if as_json {
        let json_items = notes
            .iter()
            .map(note_to_list_item)
            .collect::<Vec<NoteListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_note_lines(&notes) {
            println!("{line}");
        }
    }

    Ok(())
}
