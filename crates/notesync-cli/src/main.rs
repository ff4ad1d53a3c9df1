//! notesync CLI - local-first notes with GitHub sync from the terminal

mod cli;
mod commands;
mod error;
#[cfg(test)]
mod tests;

use clap::Parser;

use crate::cli::{Cli, Commands, ConfigCommands, FolderCommands, SyncCommands};
use crate::commands::add::run_add;
use crate::commands::common::resolve_db_path;
use crate::commands::config::{
    run_config_clear, run_config_set_repo, run_config_show, SetRepoArgs,
};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::folder::{
    run_folder_add, run_folder_delete, run_folder_list, run_folder_rename,
};
use crate::commands::list::run_list;
use crate::commands::repos::run_repos;
use crate::commands::show::run_show;
use crate::commands::sync::{
    run_sync, run_sync_diff, run_sync_push, run_sync_resolve, run_sync_status,
};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "notesync=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add {
            content,
            title,
            folder,
            kind,
        } => {
            run_add(
                &content,
                title.as_deref(),
                folder.as_deref(),
                kind.into(),
                &db_path,
            )
            .await?;
        }
        Commands::List {
            folder,
            status,
            limit,
            json,
        } => {
            run_list(folder.as_deref(), status.map(Into::into), limit, json, &db_path).await?;
        }
        Commands::Show { id, json } => run_show(&id, json, &db_path).await?,
        Commands::Edit { id, content, title } => {
            run_edit(&id, content.as_deref(), title.as_deref(), &db_path).await?;
        }
        Commands::Delete { id } => run_delete(&id, &db_path).await?,
        Commands::Folder { command } => match command {
            FolderCommands::Add { name } => run_folder_add(&name, &db_path).await?,
            FolderCommands::List { json } => run_folder_list(json, &db_path).await?,
            FolderCommands::Rename { folder, name } => {
                run_folder_rename(&folder, &name, &db_path).await?;
            }
            FolderCommands::Delete { folder } => run_folder_delete(&folder, &db_path).await?,
        },
        Commands::Config { command } => match command {
            ConfigCommands::SetRepo {
                owner,
                repo,
                branch,
                base_path,
                token,
            } => {
                let args = SetRepoArgs {
                    owner: &owner,
                    repo: &repo,
                    branch: &branch,
                    base_path: &base_path,
                    token,
                };
                run_config_set_repo(args, &db_path).await?;
            }
            ConfigCommands::Show => run_config_show(&db_path).await?,
            ConfigCommands::Clear => run_config_clear(&db_path).await?,
        },
        Commands::Repos { json } => run_repos(json, &db_path).await?,
        Commands::Sync { command } => match command {
            None => run_sync(&db_path).await?,
            Some(SyncCommands::Push { id }) => run_sync_push(&id, &db_path).await?,
            Some(SyncCommands::Status { json }) => run_sync_status(json, &db_path).await?,
            Some(SyncCommands::Diff { id }) => run_sync_diff(&id, &db_path).await?,
            Some(SyncCommands::Resolve { id, keep }) => {
                run_sync_resolve(&id, keep, &db_path).await?;
            }
        },
    }

    Ok(())
}
