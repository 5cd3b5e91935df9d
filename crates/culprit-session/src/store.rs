//! Flat-file persistence for hunt sessions and the war-story archive.
//!
//! Both stores are single JSON arrays, read-modify-written atomically
//! (temp file in the same directory, then rename). Sessions are mutable
//! only by appending to their lists or flipping `resolved`; war stories
//! are append-only and never pruned.

use crate::paths::CulpritPaths;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed store {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// One tested commit within a hunt session. Append-only audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TestEntry {
    pub commits_ago: u64,
    pub test_result: bool,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One finding noted toward the eventual war story.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    pub timestamp: String,
    pub finding: String,
}

/// One bug-hunting workspace, keyed by its unique branch name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuntSession {
    pub branch_name: String,
    pub created_at: String,
    #[serde(default)]
    pub issue_description: String,
    #[serde(default)]
    pub commits_tested: Vec<TestEntry>,
    #[serde(default)]
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub resolved: bool,
}

/// Archived record of a finished hunt, retained after its branch is gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarStory {
    pub branch_name: String,
    pub issue_description: String,
    pub findings: Vec<Finding>,
    pub resolved_at: String,
}

/// Read/write access to the two JSON stores under `.culprit/`.
pub struct SessionStore {
    paths: CulpritPaths,
}

impl SessionStore {
    /// Open the store, creating the `.culprit/` directory if needed.
    pub fn open(repo_root: impl Into<std::path::PathBuf>) -> Result<Self, StoreError> {
        let paths = CulpritPaths::discover(repo_root);
        paths.ensure_layout().map_err(|source| StoreError::Write {
            path: paths.culprit_dir.display().to_string(),
            source,
        })?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &CulpritPaths {
        &self.paths
    }

    pub fn load_sessions(&self) -> Result<Vec<HuntSession>, StoreError> {
        read_array(&self.paths.sessions_file)
    }

    pub fn save_sessions(&self, sessions: &[HuntSession]) -> Result<(), StoreError> {
        write_array(&self.paths.sessions_file, sessions)
    }

    pub fn load_war_stories(&self) -> Result<Vec<WarStory>, StoreError> {
        read_array(&self.paths.war_stories_file)
    }

    pub fn append_war_story(&self, story: WarStory) -> Result<(), StoreError> {
        let mut stories = self.load_war_stories()?;
        stories.push(story);
        write_array(&self.paths.war_stories_file, &stories)
    }
}

fn read_array<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_str(&content).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn write_array<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.display().to_string(),
        source,
    };
    let json = serde_json::to_vec_pretty(items).map_err(|source| StoreError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(write_err)?;
    tmp.write_all(&json).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
