//! Resolves the ordered commit window a hunt searches over.

use crate::error::VcsError;
use crate::git::run_git;
use serde::Serialize;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

/// Current UTC instant as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

/// One commit under test. Index 0 is the oldest commit in the resolved
/// window; `test_result` stays `None` until an oracle has run against it.
#[derive(Debug, Clone, Serialize)]
pub struct CommitRecord {
    pub hash: String,
    pub index: usize,
    pub total: usize,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub test_result: Option<bool>,
}

impl CommitRecord {
    /// Abbreviated hash for display.
    pub fn short_hash(&self) -> &str {
        &self.hash[..self.hash.len().min(8)]
    }
}

/// Queries git history for the commits inside a trailing time window.
pub struct CommitTimeline {
    repo_root: PathBuf,
}

impl CommitTimeline {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Every commit at or after `now - days_ago` days, oldest first.
    ///
    /// Strictly increasing chronological order is what makes the bisection
    /// window valid: index 0 is the oldest candidate. An empty window is a
    /// normal outcome, not an error.
    pub fn resolve(&self, days_ago: u64) -> Result<Vec<CommitRecord>, VcsError> {
        let cutoff = OffsetDateTime::now_utc() - Duration::days(days_ago as i64);
        let cutoff = cutoff.format(&Rfc3339).map_err(|e| VcsError::Parse {
            command: "git log".to_string(),
            detail: format!("cannot format cutoff instant: {e}"),
        })?;

        let since = format!("--since={cutoff}");
        let stdout = run_git(
            &self.repo_root,
            &["log", &since, "--format=%H %ct", "--reverse"],
        )?;

        let mut commits = Vec::new();
        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            commits.push(parse_commit_line(line)?);
        }
        let total = commits.len();
        for (index, commit) in commits.iter_mut().enumerate() {
            commit.index = index;
            commit.total = total;
        }
        tracing::debug!(days_ago, total, "resolved commit window");
        Ok(commits)
    }

    /// Look up a single commit by hash (or any ref git can resolve) as a
    /// standalone one-element window.
    pub fn lookup(&self, hash: &str) -> Result<CommitRecord, VcsError> {
        let stdout = run_git(&self.repo_root, &["show", "-s", "--format=%H %ct", hash])?;
        let line = stdout.lines().next().unwrap_or_default();
        let mut commit = parse_commit_line(line)?;
        commit.index = 0;
        commit.total = 1;
        Ok(commit)
    }

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }
}

fn parse_commit_line(line: &str) -> Result<CommitRecord, VcsError> {
    let parse_err = |detail: String| VcsError::Parse {
        command: "git log".to_string(),
        detail,
    };

    let (hash, epoch) = line
        .trim()
        .split_once(' ')
        .ok_or_else(|| parse_err(format!("malformed log line: {line:?}")))?;
    let epoch: i64 = epoch
        .trim()
        .parse()
        .map_err(|_| parse_err(format!("bad commit timestamp: {line:?}")))?;
    let timestamp = OffsetDateTime::from_unix_timestamp(epoch)
        .map_err(|_| parse_err(format!("commit timestamp out of range: {epoch}")))?;

    Ok(CommitRecord {
        hash: hash.to_string(),
        index: 0,
        total: 0,
        timestamp,
        test_result: None,
    })
}
