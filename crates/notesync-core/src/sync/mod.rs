//! Note sync against a remote file store.
//!
//! [`SyncEngine`] pushes pending notes through a [`RemoteFileStore`]; the
//! [`conflict`] and [`diff`] modules hold the pure comparison logic the engine
//! and UIs share.

pub mod conflict;
pub mod diff;
mod engine;
pub mod github;
mod remote;

pub use conflict::{
    detect_conflict, manual_merge, resolve_keep_local, resolve_keep_remote, ConflictResult,
};
pub use diff::{diff_stats, format_diff, generate_diff, DiffKind, DiffLine, DiffStats};
pub use engine::{
    ConflictResolution, SyncAction, SyncEngine, SyncProgress, SyncReport, SyncResult,
};
pub use github::{GitHubConnector, GitHubContentsClient};
pub use remote::{RemoteConnector, RemoteError, RemoteFileStore, RemoteResult};
