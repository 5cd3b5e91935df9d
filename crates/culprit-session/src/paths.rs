use culprit_core::config::CULPRIT_DIR;
use std::path::{Path, PathBuf};

/// Filesystem layout of the `.culprit/` state directory.
#[derive(Debug, Clone)]
pub struct CulpritPaths {
    pub root: PathBuf,
    pub culprit_dir: PathBuf,
    pub sessions_file: PathBuf,
    pub war_stories_file: PathBuf,
    pub lock_file: PathBuf,
}

impl CulpritPaths {
    pub fn discover(repo_root: impl Into<PathBuf>) -> Self {
        let root = repo_root.into();
        let culprit_dir = root.join(CULPRIT_DIR);
        Self {
            sessions_file: culprit_dir.join("sessions.json"),
            war_stories_file: culprit_dir.join("war_stories.json"),
            lock_file: culprit_dir.join("LOCK"),
            culprit_dir,
            root,
        }
    }

    pub fn ensure_layout(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.culprit_dir)
    }

    pub fn is_initialized(&self) -> bool {
        self.culprit_dir.is_dir()
    }

    pub fn repo_root(&self) -> &Path {
        &self.root
    }
}
