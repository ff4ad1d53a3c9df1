//! Folder model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::util::{now_millis, slugify};

/// A unique identifier for a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderId(Uuid);

impl FolderId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for FolderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A folder grouping notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    /// Folder location in the remote repository
    pub remote_path: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Folder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let now = now_millis();
        let name = name.into();
        Self {
            id: FolderId::new(),
            remote_path: folder_path(&name),
            name,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.remote_path = folder_path(&self.name);
        self.updated_at = now_millis().max(self.updated_at);
    }
}

fn folder_path(name: &str) -> String {
    format!("folders/{}", slugify(name))
}
