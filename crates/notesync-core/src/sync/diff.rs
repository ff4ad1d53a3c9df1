//! Line diff used to display and merge conflicting note versions.
//!
//! The walk is greedy: at a mismatch it looks ahead for the nearest
//! resynchronisation point instead of computing a minimal edit script. Good
//! enough for showing a user what changed, not for generating patches.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Which side a diff line belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Only in the remote version
    Added,
    /// Only in the local version
    Removed,
    Unchanged,
}

impl DiffKind {
    const fn prefix(self) -> &'static str {
        match self {
            Self::Added => "+ ",
            Self::Removed => "- ",
            Self::Unchanged => "  ",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffKind,
    pub line: String,
}

impl DiffLine {
    fn new(kind: DiffKind, line: &str) -> Self {
        Self {
            kind,
            line: line.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub total: usize,
}

/// Diff `local` against `remote`, line by line.
///
/// Both inputs are split on `'\n'`, so an empty string is a single empty line.
pub fn generate_diff(local: &str, remote: &str) -> Vec<DiffLine> {
    let local: Vec<&str> = local.split('\n').collect();
    let remote: Vec<&str> = remote.split('\n').collect();

    let mut diff = Vec::with_capacity(local.len().max(remote.len()));
    let (mut i, mut j) = (0, 0);

    while i < local.len() || j < remote.len() {
        if i >= local.len() {
            diff.push(DiffLine::new(DiffKind::Added, remote[j]));
            j += 1;
            continue;
        }
        if j >= remote.len() {
            diff.push(DiffLine::new(DiffKind::Removed, local[i]));
            i += 1;
            continue;
        }

        let (local_line, remote_line) = (local[i], remote[j]);
        if local_line == remote_line {
            diff.push(DiffLine::new(DiffKind::Unchanged, local_line));
            i += 1;
            j += 1;
            continue;
        }

        let local_in_remote = remote[j..].iter().position(|line| *line == local_line);
        let remote_in_local = local[i..].iter().position(|line| *line == remote_line);

        match (local_in_remote, remote_in_local) {
            // Local line shows up again sooner: remote inserted lines before it
            (Some(_), None) => {
                diff.push(DiffLine::new(DiffKind::Added, remote_line));
                j += 1;
            }
            (Some(ahead), Some(behind)) if ahead < behind => {
                diff.push(DiffLine::new(DiffKind::Added, remote_line));
                j += 1;
            }
            // Ties resolve to removal
            (_, Some(_)) => {
                diff.push(DiffLine::new(DiffKind::Removed, local_line));
                i += 1;
            }
            (None, None) => {
                diff.push(DiffLine::new(DiffKind::Removed, local_line));
                diff.push(DiffLine::new(DiffKind::Added, remote_line));
                i += 1;
                j += 1;
            }
        }
    }

    diff
}

/// Count lines per kind.
pub fn diff_stats(diff: &[DiffLine]) -> DiffStats {
    let mut stats = DiffStats {
        total: diff.len(),
        ..DiffStats::default()
    };
    for line in diff {
        match line.kind {
            DiffKind::Added => stats.added += 1,
            DiffKind::Removed => stats.removed += 1,
            DiffKind::Unchanged => stats.unchanged += 1,
        }
    }
    stats
}

/// Render a diff with `+ `, `- ` and two-space prefixes, one entry per line.
pub fn format_diff(diff: &[DiffLine]) -> String {
    let mut out = String::new();
    for (idx, line) in diff.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        let _ = write!(out, "{}{}", line.kind.prefix(), line.line);
    }
    out
}
