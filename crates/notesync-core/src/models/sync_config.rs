//! Repository sync configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::util::{join_remote_path, normalize_text_option};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_BASE_PATH: &str = "notes";

/// Target repository and credential for note sync.
///
/// Stored once per installation in the config table. When it is absent, sync
/// is disabled and every sync operation is a no-op.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySyncConfig {
    /// User or organization owning the repository
    pub owner: String,
    pub repo: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Directory inside the repository that holds note files
    #[serde(default = "default_base_path")]
    pub base_path: String,
    /// Access token with contents read/write permission
    pub token: String,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_base_path() -> String {
    DEFAULT_BASE_PATH.to_string()
}

impl RepositorySyncConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            branch: default_branch(),
            base_path: default_base_path(),
            token: token.into(),
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Trim every field, apply defaults for blank branch/base path, and reject
    /// a config that cannot address a repository.
    pub fn normalized(self) -> Result<Self> {
        let owner = normalize_text_option(Some(self.owner))
            .ok_or_else(|| Error::InvalidInput("repository owner must not be empty".into()))?;
        let repo = normalize_text_option(Some(self.repo))
            .ok_or_else(|| Error::InvalidInput("repository name must not be empty".into()))?;
        let token = normalize_text_option(Some(self.token))
            .ok_or_else(|| Error::InvalidInput("access token must not be empty".into()))?;
        let branch = normalize_text_option(Some(self.branch)).unwrap_or_else(default_branch);
        let base_path = self.base_path.trim().trim_matches('/').to_string();

        Ok(Self {
            owner,
            repo,
            branch,
            base_path,
            token,
        })
    }

    /// `owner/repo`
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Full file path of a note inside the repository
    #[must_use]
    pub fn remote_path(&self, note_path: &str) -> String {
        join_remote_path(&self.base_path, note_path)
    }
}

impl fmt::Debug for RepositorySyncConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RepositorySyncConfig")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("base_path", &self.base_path)
            .field("token", &"[REDACTED]")
            .finish()
    }
}
