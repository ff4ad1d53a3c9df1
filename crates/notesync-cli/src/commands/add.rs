use std::path::Path;

use notesync_core::NoteKind;

use crate::commands::common::{default_folder, open_store, resolve_folder, resolve_note_content};
use crate::error::CliError;

pub async fn run_add(
    content_parts: &[String],
    title: Option<&str>,
    folder: Option<&str>,
    kind: NoteKind,
    db_path: &Path,
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;

    let store = open_store(db_path).await?;
    let folder_id = match folder {
        Some(query) => resolve_folder(query, &store).await?.id,
        None => default_folder(&store).await?,
    };

    let mut note = store.create_note(kind, &folder_id, title).await?;
    if !content.is_empty() {
        note = store.update_note_content(&note.id, &content).await?;
    }

    println!("{}", note.id);
    Ok(())
}
