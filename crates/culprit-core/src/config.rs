//! Hunt configuration, stored as `.culprit/config.json` in the repo under
//! investigation. Missing or unparseable config falls back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory culprit keeps its state in, relative to the repo root.
pub const CULPRIT_DIR: &str = ".culprit";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Log file of the service under test, relative to the repo root
    /// unless absolute.
    pub log_file: PathBuf,
    /// Directory holding the service's SQLite database(s).
    pub db_dir: PathBuf,
    /// Health endpoint probed by the HTTP oracle.
    pub http_url: String,
    pub http_expect_status: u16,
    /// How long an oracle waits for the service to restart after checkout.
    pub grace_secs: u64,
    pub poll_interval_ms: u64,
    /// Branch cleanup switches to when no original branch was recorded.
    pub fallback_branch: String,
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("logs/service.log"),
            db_dir: PathBuf::from("data"),
            http_url: String::from("http://127.0.0.1:8080/health"),
            http_expect_status: 200,
            grace_secs: 5,
            poll_interval_ms: 250,
            fallback_branch: String::from("main"),
        }
    }
}

impl HuntConfig {
    /// Load from `<repo_root>/.culprit/config.json`. Missing file or bad
    /// JSON yields defaults rather than an error.
    pub fn load(repo_root: &Path) -> Self {
        let path = repo_root.join(CULPRIT_DIR).join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config");
                Self::default()
            }
        }
    }

    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Resolve the log file against the repo root.
    pub fn log_path(&self, repo_root: &Path) -> PathBuf {
        if self.log_file.is_absolute() {
            self.log_file.clone()
        } else {
            repo_root.join(&self.log_file)
        }
    }

    /// Resolve the database directory against the repo root.
    pub fn db_path(&self, repo_root: &Path) -> PathBuf {
        if self.db_dir.is_absolute() {
            self.db_dir.clone()
        } else {
            repo_root.join(&self.db_dir)
        }
    }
}
