use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use notesync_core::{NoteKind, SyncStatus};

#[derive(Parser)]
#[command(name = "notesync")]
#[command(about = "Local-first notes that sync to a GitHub repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content (read from stdin when omitted and piped)
        content: Vec<String>,
        /// Note title
        #[arg(short, long)]
        title: Option<String>,
        /// Folder name or ID prefix (defaults to the Inbox folder)
        #[arg(short, long)]
        folder: Option<String>,
        /// Kind of note
        #[arg(long, value_enum, default_value_t = KindArg::Text)]
        kind: KindArg,
    },
    /// List notes, most recently updated first
    List {
        /// Only notes in this folder (name or ID prefix)
        #[arg(short, long)]
        folder: Option<String>,
        /// Only notes with this sync status
        #[arg(short, long, value_enum)]
        status: Option<StatusArg>,
        /// Number of notes to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a note
    Show {
        /// Note ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing note (opens $EDITOR without flags)
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// Replace the content
        #[arg(long)]
        content: Option<String>,
        /// Rename the note
        #[arg(long)]
        title: Option<String>,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Manage folders
    Folder {
        #[command(subcommand)]
        command: FolderCommands,
    },
    /// Configure the sync repository
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// List repositories visible to the configured token
    Repos {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push pending notes to the configured repository
    Sync {
        #[command(subcommand)]
        command: Option<SyncCommands>,
    },
}

#[derive(Subcommand)]
pub enum FolderCommands {
    /// Create a folder
    Add {
        name: String,
    },
    /// List folders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a folder
    Rename {
        /// Folder name or ID prefix
        folder: String,
        name: String,
    },
    /// Delete a folder and every note in it
    Delete {
        /// Folder name or ID prefix
        folder: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set the GitHub repository notes sync to
    SetRepo {
        /// Repository owner (user or organization)
        owner: String,
        /// Repository name
        repo: String,
        /// Branch to commit to
        #[arg(long, default_value = notesync_core::models::DEFAULT_BRANCH)]
        branch: String,
        /// Directory inside the repository for note files
        #[arg(long, default_value = notesync_core::models::DEFAULT_BASE_PATH)]
        base_path: String,
        /// Access token (falls back to NOTESYNC_GITHUB_TOKEN, then the stored token)
        #[arg(long)]
        token: Option<String>,
    },
    /// Show the sync configuration (token redacted)
    Show,
    /// Disable sync by removing the configuration
    Clear,
}

#[derive(Subcommand)]
pub enum SyncCommands {
    /// Push a single note
    Push {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Count notes by sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the diff between a local note and its remote file
    Diff {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Resolve a conflicted note
    Resolve {
        /// Note ID or unique ID prefix
        id: String,
        /// Which version wins
        #[arg(long, value_enum)]
        keep: KeepSide,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Text,
    Drawing,
}

impl From<KindArg> for NoteKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Text => Self::Text,
            KindArg::Drawing => Self::Drawing,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusArg {
    Pending,
    Synced,
    Conflict,
    Error,
}

impl From<StatusArg> for SyncStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Pending => Self::Pending,
            StatusArg::Synced => Self::Synced,
            StatusArg::Conflict => Self::Conflict,
            StatusArg::Error => Self::Error,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KeepSide {
    Local,
    Remote,
}
