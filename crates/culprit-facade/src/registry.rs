//! The keyword-dispatch entry point: a fixed tool registry built once and
//! injected into the facade, never module-level mutable state.

use crate::outcome::Outcome;
use crate::parse::CommandParser;
use crate::request::{
    BranchCleanupRequest, BranchCreateRequest, CheckCommitRequest, HuntRegressionRequest,
    ListCommitsRequest, MarkResolvedRequest, RecordTestRequest,
};
use culprit_core::{check_commit, oracle, BisectionEngine, CommitTimeline, HuntConfig, Oracle, WorkspaceCheckout};
use culprit_session::HuntManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;

pub type Handler = fn(&mut Facade, Value) -> Outcome;

/// Immutable tool-name → handler mapping.
#[derive(Clone)]
pub struct Registry {
    tools: Vec<(&'static str, Handler)>,
}

impl Registry {
    pub fn standard() -> Self {
        Self {
            tools: vec![
                ("hunt_regression", handlers::hunt_regression as Handler),
                ("list_commits", handlers::list_commits),
                ("check_commit", handlers::check_commit_tool),
                ("branch_create", handlers::branch_create),
                ("branch_list", handlers::branch_list),
                ("branch_cleanup", handlers::branch_cleanup),
                ("record_test", handlers::record_test),
                ("mark_resolved", handlers::mark_resolved),
            ],
        }
    }

    pub fn lookup(&self, tool: &str) -> Option<Handler> {
        self.tools
            .iter()
            .find(|(name, _)| *name == tool)
            .map(|(_, handler)| *handler)
    }

    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|(name, _)| *name).collect()
    }
}

/// Single dispatch surface over the bisection engine and the hunt-branch
/// lifecycle.
pub struct Facade {
    repo_root: PathBuf,
    config: HuntConfig,
    manager: HuntManager,
    registry: Registry,
    parser: CommandParser,
}

impl Facade {
    /// Open a facade over one repository with the standard registry and
    /// grammar table.
    pub fn open(repo_root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Self::with_registry(repo_root, Registry::standard())
    }

    /// Open with a caller-supplied registry (tests inject scripted tools).
    pub fn with_registry(repo_root: impl Into<PathBuf>, registry: Registry) -> anyhow::Result<Self> {
        let repo_root = repo_root.into();
        let config = HuntConfig::load(&repo_root);
        let manager = HuntManager::open(&repo_root, config.fallback_branch.clone())?;
        Ok(Self {
            repo_root,
            config,
            manager,
            registry,
            parser: CommandParser::standard(),
        })
    }

    pub fn config(&self) -> &HuntConfig {
        &self.config
    }

    /// Keyword entry point: look `tool` up in the registry and forward the
    /// JSON parameters. Unknown names come back as a structured failure
    /// listing the valid tools.
    pub fn execute(&mut self, tool: &str, params: Value) -> Outcome {
        match self.registry.lookup(tool) {
            Some(handler) => {
                tracing::debug!(tool, "dispatching");
                handler(self, params)
            }
            None => Outcome::fail(format!(
                "unknown tool \"{tool}\"; valid tools: {}",
                self.registry.tool_names().join(", ")
            )),
        }
    }

    /// Free-text entry point: match `input` against the fixed grammar
    /// table and forward to `execute`. Unmatched text comes back as a
    /// structured failure listing the supported grammars.
    pub fn parse(&mut self, input: &str) -> Outcome {
        match self.parser.match_input(input) {
            Some((tool, params)) => self.execute(tool, params),
            None => Outcome::fail(format!(
                "unrecognized command {:?}; supported: {}",
                input.trim(),
                self.parser.usages().join(" | ")
            )),
        }
    }

    fn build_oracle(&self, pattern: Option<&str>) -> Box<dyn Oracle> {
        oracle::for_pattern(&self.config, &self.repo_root, pattern)
    }
}

fn to_data<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, Outcome> {
    serde_json::from_value(params)
        .map_err(|e| Outcome::fail(format!("invalid parameters for {tool}: {e}")))
}

mod handlers {
    use super::*;

    pub fn hunt_regression(facade: &mut Facade, params: Value) -> Outcome {
        let req: HuntRegressionRequest = match parse_params("hunt_regression", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        if let Err(e) = req.validate() {
            return Outcome::fail(format!("invalid hunt_regression request: {e}"));
        }

        let commits = match CommitTimeline::new(&facade.repo_root).resolve(req.days_ago) {
            Ok(c) => c,
            Err(e) => {
                return Outcome::fail(format!(
                    "cannot resolve commit window ({} days): {e}",
                    req.days_ago
                ))
            }
        };

        // Bisection moves HEAD, so it takes the same repository lease as
        // the branch lifecycle.
        let _lock = match facade.manager.lock() {
            Ok(lock) => lock,
            Err(e) => return Outcome::fail(format!("cannot start bisection: {e}")),
        };

        let oracle = facade.build_oracle(req.pattern.as_deref());
        let mut workspace = WorkspaceCheckout::new(&facade.repo_root);
        let result = BisectionEngine::new(&mut workspace, oracle.as_ref()).run(commits);

        match result.aborted.clone() {
            Some(reason) => Outcome::fail_with(
                format!("bisection aborted after {} tests: {reason}", result.tests_run),
                to_data(&result),
            ),
            None => Outcome::ok(to_data(&result)),
        }
    }

    pub fn list_commits(facade: &mut Facade, params: Value) -> Outcome {
        let req: ListCommitsRequest = match parse_params("list_commits", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        if let Err(e) = req.validate() {
            return Outcome::fail(format!("invalid list_commits request: {e}"));
        }

        match CommitTimeline::new(&facade.repo_root).resolve(req.days_ago) {
            Ok(commits) => Outcome::ok(json!({
                "days_ago": req.days_ago,
                "total": commits.len(),
                "commits": to_data(&commits),
            })),
            Err(e) => Outcome::fail(format!(
                "cannot resolve commit window ({} days): {e}",
                req.days_ago
            )),
        }
    }

    pub fn check_commit_tool(facade: &mut Facade, params: Value) -> Outcome {
        let req: CheckCommitRequest = match parse_params("check_commit", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        if let Err(e) = req.validate() {
            return Outcome::fail(format!("invalid check_commit request: {e}"));
        }

        let mut commit = match CommitTimeline::new(&facade.repo_root).lookup(&req.hash) {
            Ok(c) => c,
            Err(e) => return Outcome::fail(format!("cannot resolve commit {}: {e}", req.hash)),
        };

        let _lock = match facade.manager.lock() {
            Ok(lock) => lock,
            Err(e) => return Outcome::fail(format!("cannot check commit: {e}")),
        };

        let oracle = facade.build_oracle(Some(&req.pattern));
        let mut workspace = WorkspaceCheckout::new(&facade.repo_root);
        match check_commit(&mut workspace, oracle.as_ref(), &mut commit) {
            Some(passed) => Outcome::ok(json!({
                "hash": commit.hash,
                "oracle": oracle.describe(),
                "feature_present": passed,
            })),
            None => Outcome::fail(format!("checkout failed for {}", commit.hash)),
        }
    }

    pub fn branch_create(facade: &mut Facade, params: Value) -> Outcome {
        let req: BranchCreateRequest = match parse_params("branch_create", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        match facade.manager.create(&req.description) {
            Ok(session) => Outcome::ok(to_data(&session)),
            Err(e) => Outcome::fail(format!("cannot create hunt branch: {e}")),
        }
    }

    pub fn branch_list(facade: &mut Facade, _params: Value) -> Outcome {
        match facade.manager.list() {
            Ok(branches) => Outcome::ok(json!({
                "total": branches.len(),
                "branches": to_data(&branches),
            })),
            Err(e) => Outcome::fail(format!("cannot list hunt branches: {e}")),
        }
    }

    pub fn branch_cleanup(facade: &mut Facade, params: Value) -> Outcome {
        let req: BranchCleanupRequest = match parse_params("branch_cleanup", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        match facade.manager.cleanup(req.force) {
            Ok(report) => Outcome::ok(to_data(&report)),
            Err(e) => Outcome::fail(format!("cleanup failed: {e}")),
        }
    }

    pub fn record_test(facade: &mut Facade, params: Value) -> Outcome {
        let req: RecordTestRequest = match parse_params("record_test", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        match facade
            .manager
            .record_test(req.commits_ago, req.passed, req.notes.as_deref())
        {
            Ok(()) => Outcome::ok(json!({
                "commits_ago": req.commits_ago,
                "test_result": req.passed,
            })),
            Err(e) => Outcome::fail(format!("cannot record test: {e}")),
        }
    }

    pub fn mark_resolved(facade: &mut Facade, params: Value) -> Outcome {
        let req: MarkResolvedRequest = match parse_params("mark_resolved", params) {
            Ok(r) => r,
            Err(outcome) => return outcome,
        };
        match facade.manager.mark_resolved(req.finding.as_deref()) {
            Ok(()) => Outcome::ok(json!({ "resolved": true })),
            Err(e) => Outcome::fail(format!("cannot mark resolved: {e}")),
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

    fn init_repo_with_commits(dir: &Path, n: usize) {
        git(dir, &["init", "-q", "-b", "main"]);
        git(dir, &["config", "user.email", "test@test.com"]);
        git(dir, &["config", "user.name", "Test"]);
        for i in 0..n {
            std::fs::write(dir.join("f.txt"), format!("rev {i}")).unwrap();
            git(dir, &["add", "."]);
            git(dir, &["commit", "-q", "-m", &format!("commit {i}")]);
        }
        // No restart grace: oracles read once and move on.
        let culprit = dir.join(".culprit");
        std::fs::create_dir_all(&culprit).unwrap();
        std::fs::write(culprit.join("config.json"), r#"{"grace_secs": 0}"#).unwrap();
    }

    #[test]
    fn unknown_tool_lists_valid_names() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 1);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let outcome = facade.execute("frobnicate", json!({}));
        assert!(!outcome.success);
        let error = outcome.error.unwrap();
        assert!(error.contains("frobnicate"));
        assert!(error.contains("hunt_regression"));
        assert!(error.contains("branch_cleanup"));
    }

    #[test]
    fn invalid_params_are_a_structured_failure() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 1);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let outcome = facade.execute("list_commits", json!({"days_ago": "soon"}));
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("list_commits"));

        let outcome = facade.execute("check_commit", json!({"hash": "two words", "pattern": "p"}));
        assert!(!outcome.success);
    }

    #[test]
    fn list_commits_reports_window() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 3);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let outcome = facade.execute("list_commits", json!({"days_ago": 7}));
        assert!(outcome.success);
        assert_eq!(outcome.data["total"], 3);
        assert_eq!(outcome.data["commits"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn hunt_with_absent_log_reports_all_bad() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 4);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let outcome = facade.execute(
            "hunt_regression",
            json!({"days_ago": 7, "pattern": "feature ready"}),
        );
        assert!(outcome.success);
        assert_eq!(outcome.data["regression_found"], false);
        assert!(outcome.data["last_good"].is_null());
        assert_eq!(outcome.data["first_bad"]["index"], 0);
        // Tree is back where it started.
        assert_eq!(git(tmp.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    }

    #[test]
    fn execute_and_parse_agree() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 5);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let by_execute = facade.execute(
            "hunt_regression",
            json!({"days_ago": 7, "pattern": "feature ready"}),
        );
        let by_parse = facade.parse("hunt_regression 7 feature ready");
        assert_eq!(by_execute, by_parse);

        let by_execute = facade.execute("list_commits", json!({"days_ago": 7}));
        let by_parse = facade.parse("list_commits 7");
        assert_eq!(by_execute, by_parse);
    }

    #[test]
    fn check_commit_single_verdict() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 2);
        // Log exists and contains the pattern at every commit.
        std::fs::create_dir_all(tmp.path().join("logs")).unwrap();
        std::fs::write(tmp.path().join("logs/service.log"), "feature ready\n").unwrap();
        let mut facade = Facade::open(tmp.path()).unwrap();

        // Any revision git can resolve is fair input, not just raw hashes.
        let outcome = facade.execute(
            "check_commit",
            json!({"hash": "HEAD~1", "pattern": "feature ready"}),
        );
        assert!(outcome.success);
        assert_eq!(outcome.data["feature_present"], true);
        assert_eq!(
            outcome.data["hash"],
            git(tmp.path(), &["rev-parse", "HEAD~1"])
        );
        assert_eq!(git(tmp.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    }

    #[test]
    fn checkout_operations_respect_the_repo_lease() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 2);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let paths = culprit_session::CulpritPaths::discover(tmp.path());
        let held = culprit_session::RepoLock::acquire(&paths).unwrap();

        let outcome = facade.execute(
            "hunt_regression",
            json!({"days_ago": 7, "pattern": "feature ready"}),
        );
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("another culprit process"));

        let outcome = facade.execute(
            "check_commit",
            json!({"hash": "HEAD", "pattern": "feature ready"}),
        );
        assert!(!outcome.success);

        drop(held);
        let outcome = facade.execute(
            "hunt_regression",
            json!({"days_ago": 7, "pattern": "feature ready"}),
        );
        assert!(outcome.success);
    }

    #[test]
    fn branch_lifecycle_through_the_facade() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 1);
        let mut facade = Facade::open(tmp.path()).unwrap();

        let outcome = facade.execute("branch_create", json!({"description": "broken search"}));
        assert!(outcome.success);
        let branch = outcome.data["branch_name"].as_str().unwrap().to_string();
        assert!(branch.starts_with("hunt/"));

        let outcome = facade.execute(
            "record_test",
            json!({"commits_ago": 4, "passed": false, "notes": "broken here"}),
        );
        assert!(outcome.success);

        let outcome = facade.execute("mark_resolved", json!({"finding": "cache key typo"}));
        assert!(outcome.success);

        let outcome = facade.execute("branch_list", json!({}));
        assert!(outcome.success);
        assert_eq!(outcome.data["total"], 1);
        assert_eq!(outcome.data["branches"][0]["commits_tested"], 1);

        let outcome = facade.execute("branch_cleanup", json!({}));
        assert!(outcome.success);
        assert_eq!(outcome.data["deleted_branches"], 1);
        assert_eq!(outcome.data["stories_extracted"], 1);
        assert_eq!(git(tmp.path(), &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    }

    #[test]
    fn table_prefix_selects_relational_oracle() {
        let tmp = tempfile::tempdir().unwrap();
        init_repo_with_commits(tmp.path(), 1);
        let facade = Facade::open(tmp.path()).unwrap();

        let oracle = facade.build_oracle(Some("table:users"));
        assert!(oracle.describe().contains("table \"users\""));
        let oracle = facade.build_oracle(Some("plain pattern"));
        assert!(oracle.describe().starts_with("log-pattern"));
        let oracle = facade.build_oracle(None);
        assert!(oracle.describe().starts_with("GET "));
    }
}
