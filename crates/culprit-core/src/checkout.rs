//! Switches the working tree between commits and restores the starting
//! point when a hunt is over.

use crate::error::VcsError;
use crate::git::run_git;
use std::path::PathBuf;

/// Seam between the bisection engine and the working tree. Production code
/// uses [`WorkspaceCheckout`]; engine tests substitute a scripted tree.
pub trait Workspace {
    /// Switch the tree to `hash`. `false` means the switch failed and the
    /// tree is in whatever state the VCS left it.
    fn checkout(&mut self, hash: &str) -> bool;

    /// Switch back to whatever was checked out before the first `checkout`.
    /// Safe to call repeatedly; a no-op success before any checkout.
    fn restore(&mut self) -> bool;
}

/// Stateful checkout driver over one git working tree.
///
/// Checking out a commit is expected to make an external file-watcher
/// restart the service under test. This type does not wait for that
/// restart; the oracle does.
///
/// The driver takes no lock of its own. Callers that move HEAD hold the
/// repository lease (`.culprit/LOCK`) for the duration, as the facade and
/// CLI entry points do.
pub struct WorkspaceCheckout {
    repo_root: PathBuf,
    original: Option<String>,
}

impl WorkspaceCheckout {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            original: None,
        }
    }

    /// Record the current HEAD as the restore point. Idempotent: the first
    /// recorded value wins for the lifetime of this object.
    pub fn begin(&mut self) -> Result<(), VcsError> {
        if self.original.is_some() {
            return Ok(());
        }
        let head = run_git(&self.repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])?;
        // Detached HEAD has no branch name; fall back to the commit hash.
        let head = if head == "HEAD" {
            run_git(&self.repo_root, &["rev-parse", "HEAD"])?
        } else {
            head
        };
        tracing::debug!(original = %head, "recorded restore point");
        self.original = Some(head);
        Ok(())
    }

    /// The restore point recorded by `begin`, if any.
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }
}

impl Workspace for WorkspaceCheckout {
    fn checkout(&mut self, hash: &str) -> bool {
        if let Err(e) = self.begin() {
            tracing::warn!(error = %e, "cannot record restore point");
            return false;
        }
        match run_git(&self.repo_root, &["checkout", "-q", hash]) {
            Ok(_) => {
                tracing::debug!(%hash, "checked out");
                true
            }
            Err(e) => {
                tracing::warn!(%hash, error = %e, "checkout failed");
                false
            }
        }
    }

    fn restore(&mut self) -> bool {
        let Some(original) = self.original.clone() else {
            return true;
        };
        match run_git(&self.repo_root, &["checkout", "-q", &original]) {
            Ok(_) => {
                tracing::debug!(%original, "restored working tree");
                true
            }
            Err(e) => {
                tracing::warn!(%original, error = %e, "restore failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::process::Command;

    fn git(dir: &Path, args: &[&str]) -> String {
        let out = Command::new("git").args(args).current_dir(dir).output().unwrap();
        assert!(out.status.success(), "git {args:?} failed");
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    fn init_repo_with_commits(dir: &Path, n: usize) -> Vec<String> {
        git(dir, &["init", "-q", "-b", "main"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        let mut hashes = Vec::new();
        for i in 0..n {
            std::fs::write(dir.join("f.txt"), format!("rev {i}")).unwrap();
            git(dir, &["add", "."]);
            git(dir, &["commit", "-q", "-m", &format!("commit {i}")]);
            hashes.push(git(dir, &["rev-parse", "HEAD"]));
        }
        hashes
    }

    #[test]
    fn checkout_and_restore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let hashes = init_repo_with_commits(dir.path(), 2);

        let mut ws = WorkspaceCheckout::new(dir.path());
        assert!(ws.checkout(&hashes[0]));
        assert_eq!(git(dir.path(), &["rev-parse", "HEAD"]), hashes[0]);

        assert!(ws.restore());
        assert_eq!(git(dir.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
        assert_eq!(git(dir.path(), &["rev-parse", "HEAD"]), hashes[1]);
    }

    #[test]
    fn begin_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let hashes = init_repo_with_commits(dir.path(), 2);

        let mut ws = WorkspaceCheckout::new(dir.path());
        ws.begin().unwrap();
        assert_eq!(ws.original(), Some("main"));

        // A second begin after moving the tree keeps the first value.
        git(dir.path(), &["checkout", "-q", &hashes[0]]);
        ws.begin().unwrap();
        assert_eq!(ws.original(), Some("main"));
        assert!(ws.restore());
    }

    #[test]
    fn restore_without_begin_is_noop_success() {
        let dir = tempfile::tempdir().unwrap();
        init_repo_with_commits(dir.path(), 1);

        let mut ws = WorkspaceCheckout::new(dir.path());
        assert!(ws.restore());
        assert!(ws.restore());
    }

    #[test]
    fn failed_checkout_reports_false() {
        let dir = tempfile::tempdir().unwrap();
        init_repo_with_commits(dir.path(), 1);

        let mut ws = WorkspaceCheckout::new(dir.path());
        assert!(!ws.checkout("0000000000000000000000000000000000000000"));
        // The restore point was still recorded before the failure.
        assert!(ws.restore());
    }
}
