use std::path::Path;

use crate::commands::common::{format_folder_lines, open_store, resolve_folder};
use crate::error::CliError;

pub async fn run_folder_add(name: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let folder = store.create_folder(name).await?;
    println!("{}", folder.id);
    Ok(())
}

pub async fn run_folder_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let folders = store.list_folders().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&folders)?);
    } else if folders.is_empty() {
        println!("No folders yet.");
    } else {
        for line in format_folder_lines(&folders) {
            println!("{line}");
        }
    }
    Ok(())
}

pub async fn run_folder_rename(query: &str, name: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let folder = resolve_folder(query, &store).await?;
    let renamed = store.rename_folder(&folder.id, name).await?;
    println!("{}", renamed.id);
    Ok(())
}

pub async fn run_folder_delete(query: &str, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let folder = resolve_folder(query, &store).await?;
    let removed = store.delete_folder(&folder.id).await?;
    println!("Deleted folder '{}' and {removed} notes", folder.name);
    Ok(())
}
