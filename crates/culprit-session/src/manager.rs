//! Hunt-branch lifecycle: open an isolated branch, record what was tried,
//! and fold resolved hunts into the war-story archive on cleanup.

use crate::lock::RepoLock;
use crate::store::{Finding, HuntSession, SessionStore, TestEntry, WarStory};
use culprit_core::git::run_git;
use culprit_core::now_rfc3339;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;
use time::OffsetDateTime;

/// Namespace for hunt branches in the VCS.
pub const HUNT_PREFIX: &str = "hunt/";

fn branch_timestamp(now: OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}-{:02}{:02}{:02}",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// The current branch is not a hunt branch, so there is no session to
/// record against.
#[derive(Debug, Error)]
#[error("current branch \"{branch}\" is not a hunt branch")]
pub struct NoActiveSession {
    pub branch: String,
}

/// One hunt branch as shown by `list`, metadata filled from the store
/// when a session record exists.
#[derive(Debug, Clone, Serialize)]
pub struct BranchSummary {
    pub branch_name: String,
    pub created_at: String,
    pub issue_description: String,
    /// `None` when the branch exists in the VCS but has no session record.
    pub resolved: Option<bool>,
    pub commits_tested: usize,
}

/// What `cleanup` managed to do. Partial success is normal: one
/// undeletable branch never blocks the rest.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub deleted_branches: usize,
    pub stories_extracted: usize,
    pub restored_to: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

/// Drives hunt sessions over one repository.
///
/// The branch that was checked out before the first `create` call is
/// remembered once per manager instance; every later cleanup restores to
/// it (or to the configured fallback when no hunt was ever opened here).
pub struct HuntManager {
    repo_root: PathBuf,
    store: SessionStore,
    original_branch: Option<String>,
    fallback_branch: String,
}

impl HuntManager {
    pub fn open(
        repo_root: impl Into<PathBuf>,
        fallback_branch: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let repo_root = repo_root.into();
        let store = SessionStore::open(&repo_root)?;
        Ok(Self {
            repo_root,
            store,
            original_branch: None,
            fallback_branch: fallback_branch.into(),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Take the repository lease for an operation that moves HEAD outside
    /// the manager, such as a bisection run.
    pub fn lock(&self) -> anyhow::Result<RepoLock> {
        RepoLock::acquire(self.store.paths())
    }

    fn current_branch(&self) -> anyhow::Result<String> {
        Ok(run_git(&self.repo_root, &["rev-parse", "--abbrev-ref", "HEAD"])?)
    }

    fn generate_branch_name(&self, taken: &[HuntSession]) -> String {
        loop {
            let ts = branch_timestamp(OffsetDateTime::now_utc());
            let suffix: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(4)
                .map(char::from)
                .collect();
            let name = format!("{HUNT_PREFIX}{ts}-{}", suffix.to_lowercase());
            if !taken.iter().any(|s| s.branch_name == name) {
                return name;
            }
        }
    }

    /// Open a new hunt: create and check out an isolated branch, persist a
    /// fresh session record.
    pub fn create(&mut self, description: &str) -> anyhow::Result<HuntSession> {
        let _lock = RepoLock::acquire(self.store.paths())?;

        if self.original_branch.is_none() {
            self.original_branch = Some(self.current_branch()?);
        }

        let mut sessions = self.store.load_sessions()?;
        let branch_name = self.generate_branch_name(&sessions);
        run_git(&self.repo_root, &["checkout", "-q", "-b", &branch_name])?;

        let session = HuntSession {
            branch_name: branch_name.clone(),
            created_at: now_rfc3339(),
            issue_description: description.to_string(),
            commits_tested: Vec::new(),
            findings: Vec::new(),
            resolved: false,
        };
        sessions.push(session.clone());
        self.store.save_sessions(&sessions)?;

        tracing::info!(branch = %branch_name, "opened hunt session");
        Ok(session)
    }

    /// Append a tested-commit entry to the session of the currently
    /// checked-out hunt branch.
    pub fn record_test(
        &self,
        commits_ago: u64,
        passed: bool,
        notes: Option<&str>,
    ) -> anyhow::Result<()> {
        self.with_active_session(|session| {
            session.commits_tested.push(TestEntry {
                commits_ago,
                test_result: passed,
                timestamp: now_rfc3339(),
                notes: notes.map(str::to_string),
            });
        })
    }

    /// Mark the active session resolved, optionally noting a final finding.
    pub fn mark_resolved(&self, finding: Option<&str>) -> anyhow::Result<()> {
        self.with_active_session(|session| {
            session.resolved = true;
            if let Some(text) = finding {
                session.findings.push(Finding {
                    timestamp: now_rfc3339(),
                    finding: text.to_string(),
                });
            }
        })
    }

    /// Append a finding to the active session without resolving it.
    pub fn record_finding(&self, text: &str) -> anyhow::Result<()> {
        self.with_active_session(|session| {
            session.findings.push(Finding {
                timestamp: now_rfc3339(),
                finding: text.to_string(),
            });
        })
    }

    fn with_active_session(
        &self,
        mutate: impl FnOnce(&mut HuntSession),
    ) -> anyhow::Result<()> {
        let branch = self.current_branch()?;
        if !branch.starts_with(HUNT_PREFIX) {
            return Err(NoActiveSession { branch }.into());
        }

        let _lock = RepoLock::acquire(self.store.paths())?;
        let mut sessions = self.store.load_sessions()?;
        let session = sessions
            .iter_mut()
            .find(|s| s.branch_name == branch)
            .ok_or_else(|| anyhow::anyhow!("no session record for branch {branch}"))?;
        mutate(session);
        self.store.save_sessions(&sessions)?;
        Ok(())
    }

    /// Every hunt branch in the VCS, augmented with stored metadata.
    /// Branches without a session record are reported with "Unknown"
    /// metadata rather than failing.
    pub fn list(&self) -> anyhow::Result<Vec<BranchSummary>> {
        let stdout = run_git(
            &self.repo_root,
            &[
                "branch",
                "--list",
                &format!("{HUNT_PREFIX}*"),
                "--format=%(refname:short)",
            ],
        )?;
        let sessions = self.store.load_sessions()?;

        let summaries = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|branch| match sessions.iter().find(|s| s.branch_name == branch) {
                Some(s) => BranchSummary {
                    branch_name: s.branch_name.clone(),
                    created_at: s.created_at.clone(),
                    issue_description: s.issue_description.clone(),
                    resolved: Some(s.resolved),
                    commits_tested: s.commits_tested.len(),
                },
                None => BranchSummary {
                    branch_name: branch.to_string(),
                    created_at: String::from("Unknown"),
                    issue_description: String::from("Unknown"),
                    resolved: None,
                    commits_tested: 0,
                },
            })
            .collect();
        Ok(summaries)
    }

    /// Delete finished hunts. Resolved sessions (all sessions under
    /// `force`) have their branch deleted and any findings archived as a
    /// war story. A session whose branch cannot be deleted is kept intact,
    /// findings included, so a later cleanup can retry. Per-session store
    /// failures land in the report's `failures` list and never stop the
    /// remaining sessions from being processed.
    pub fn cleanup(&mut self, force: bool) -> anyhow::Result<CleanupReport> {
        let _lock = RepoLock::acquire(self.store.paths())?;

        let restore_to = self
            .original_branch
            .clone()
            .unwrap_or_else(|| self.fallback_branch.clone());
        let mut failures = Vec::new();
        if let Err(e) = run_git(&self.repo_root, &["checkout", "-q", &restore_to]) {
            failures.push(format!("cannot switch to {restore_to}: {e}"));
        }

        let sessions = self.store.load_sessions()?;
        let mut kept = Vec::new();
        let mut deleted_branches = 0;
        let mut stories_extracted = 0;

        for session in sessions {
            if !(session.resolved || force) {
                kept.push(session);
                continue;
            }
            match run_git(&self.repo_root, &["branch", "-q", "-D", &session.branch_name]) {
                Ok(_) => {
                    deleted_branches += 1;
                    if !session.findings.is_empty() {
                        // The branch is already gone, so the session record
                        // is dropped either way; a failed archive write is
                        // reported instead of aborting the remaining work.
                        match self.store.append_war_story(WarStory {
                            branch_name: session.branch_name.clone(),
                            issue_description: session.issue_description.clone(),
                            findings: session.findings.clone(),
                            resolved_at: now_rfc3339(),
                        }) {
                            Ok(()) => stories_extracted += 1,
                            Err(e) => failures.push(format!(
                                "cannot archive story for {}: {e}",
                                session.branch_name
                            )),
                        }
                    }
                    tracing::info!(branch = %session.branch_name, "cleaned up hunt branch");
                }
                Err(e) => {
                    failures.push(format!("cannot delete {}: {e}", session.branch_name));
                    kept.push(session);
                }
            }
        }

        self.store.save_sessions(&kept)?;
        Ok(CleanupReport {
            deleted_branches,
            stories_extracted,
            restored_to: restore_to,
            failures,
        })
    }
}
