use std::path::Path;

use crate::commands::common::{
    capture_editor_input_with_initial, normalize_note_identifier, open_store, resolve_note,
};
use crate::error::CliError;

pub async fn run_edit(
    id: &str,
    content: Option<&str>,
    title: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let normalized_id = normalize_note_identifier(id)?;
    let store = open_store(db_path).await?;
    let mut note = resolve_note(&normalized_id, &store).await?;

    if let Some(title) = title.map(str::trim).filter(|title| !title.is_empty()) {
        if title != note.title {
            note = store.rename_note(&note.id, title).await?;
        }
    }

    let new_content = match (content, title) {
        (Some(content), _) => Some(content.to_string()),
        (None, Some(_)) => None,
        (None, None) => Some(
            capture_editor_input_with_initial(&note.content)?
                .ok_or(CliError::EmptyEditedContent)?,
        ),
    };

    if let Some(new_content) = new_content {
        if new_content != note.content {
            note = store.update_note_content(&note.id, &new_content).await?;
        }
    }

    println!("{}", note.id);
    Ok(())
}
