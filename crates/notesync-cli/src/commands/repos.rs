use std::path::Path;

use crate::commands::common::{open_engine, open_store};
use crate::error::CliError;

pub async fn run_repos(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let engine = open_engine(open_store(db_path).await?)?;
    let Some(repos) = engine.list_repositories().await? else {
        return Err(CliError::SyncNotConfigured);
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&repos)?);
        return Ok(());
    }

    for repo in repos {
        let visibility = if repo.private { "private" } else { "public" };
        let branch = repo.default_branch.as_deref().unwrap_or("-");
        println!("{:<40}  {visibility:<7}  {branch}", repo.full_name);
    }
    Ok(())
}
