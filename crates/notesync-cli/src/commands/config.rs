use std::path::Path;

use notesync_core::RepositorySyncConfig;

use crate::commands::common::{open_store, resolve_token};
use crate::error::CliError;

pub struct SetRepoArgs<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub branch: &'a str,
    pub base_path: &'a str,
    pub token: Option<String>,
}

pub async fn run_config_set_repo(args: SetRepoArgs<'_>, db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    let token = resolve_token(args.token, &store).await?;

    let config = RepositorySyncConfig::new(args.owner, args.repo, token.as_str())
        .with_branch(args.branch)
        .with_base_path(args.base_path);
    let saved = store.save_sync_config(config).await?;
    store.save_auth_token(&token).await?;

    println!("Syncing to {} ({})", saved.full_name(), saved.branch);
    Ok(())
}

pub async fn run_config_show(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    match store.load_sync_config().await? {
        Some(config) => {
            for line in render_sync_config(&config) {
                println!("{line}");
            }
        }
        None => println!("Sync is disabled (no repository configured)."),
    }
    Ok(())
}

pub async fn run_config_clear(db_path: &Path) -> Result<(), CliError> {
    let store = open_store(db_path).await?;
    if store.clear_sync_config().await? {
        println!("Sync configuration removed");
    } else {
        println!("Sync was not configured");
    }
    Ok(())
}

pub fn render_sync_config(config: &RepositorySyncConfig) -> Vec<String> {
    vec![
        format!("repository: {}", config.full_name()),
        format!("branch:     {}", config.branch),
        format!(
            "base path:  {}",
            if config.base_path.is_empty() {
                "/"
            } else {
                config.base_path.as_str()
            }
        ),
        format!("token:      {}", redact_token(&config.token)),
    ]
}

/// Keep only the last four characters of a token.
pub fn redact_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 8 {
        return "****".to_string();
    }
    let tail = token.chars().skip(count - 4).collect::<String>();
    format!("****{tail}")
}
