//! The binary-search driver: halves a chronologically ordered commit
//! window until it pins the boundary between "last good" and "first bad".

use crate::checkout::Workspace;
use crate::oracle::Oracle;
use crate::timeline::CommitRecord;
use serde::Serialize;

/// Outcome of one bisection run. Return-value only, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct BisectionResult {
    pub total_commits: usize,
    pub tests_run: usize,
    pub last_good: Option<CommitRecord>,
    pub first_bad: Option<CommitRecord>,
    pub regression_found: bool,
    /// Ready-to-paste diff command between the boundary commits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_command: Option<String>,
    /// Set when a checkout failure aborted the search; the fields above
    /// then hold partial results.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted: Option<String>,
}

impl BisectionResult {
    fn empty() -> Self {
        Self {
            total_commits: 0,
            tests_run: 0,
            last_good: None,
            first_bad: None,
            regression_found: false,
            diff_command: None,
            aborted: None,
        }
    }
}

/// Binary search over a commit window.
///
/// The search maintains a `[left, right]` index window: everything left of
/// `left` is presumed good once a good commit has been seen, everything
/// right of `right` presumed bad. For `N` commits it runs at most
/// `ceil(log2(N)) + 1` checkout-and-test steps; that bound is the entire
/// point of bisecting instead of scanning.
pub struct BisectionEngine<'a> {
    workspace: &'a mut dyn Workspace,
    oracle: &'a dyn Oracle,
}

impl<'a> BisectionEngine<'a> {
    pub fn new(workspace: &'a mut dyn Workspace, oracle: &'a dyn Oracle) -> Self {
        Self { workspace, oracle }
    }

    /// Run the search over `commits` (oldest first). The working tree is
    /// restored to its starting point on every exit path.
    pub fn run(&mut self, mut commits: Vec<CommitRecord>) -> BisectionResult {
        let result = self.search(&mut commits);
        if !self.workspace.restore() {
            tracing::warn!("could not restore original checkout after bisection");
        }
        result
    }

    fn search(&mut self, commits: &mut [CommitRecord]) -> BisectionResult {
        let mut result = BisectionResult::empty();
        result.total_commits = commits.len();
        if commits.is_empty() {
            return result;
        }

        let mut left: i64 = 0;
        let mut right: i64 = commits.len() as i64 - 1;

        while left <= right {
            let mid = ((left + right) / 2) as usize;
            let commit = &mut commits[mid];

            if !self.workspace.checkout(&commit.hash) {
                // Fatal: guessing a direction after a failed switch would
                // corrupt the search. Report what we have.
                result.aborted = Some(format!("checkout failed at {}", commit.hash));
                break;
            }

            let passed = self.oracle.evaluate(commit);
            commit.test_result = Some(passed);
            result.tests_run += 1;
            tracing::info!(
                hash = %commit.short_hash(),
                index = commit.index,
                passed,
                "tested commit"
            );

            if passed {
                // Feature works here; the boundary is more recent.
                result.last_good = Some(commit.clone());
                left = mid as i64 + 1;
            } else {
                // Feature broken here; the boundary is older.
                result.first_bad = Some(commit.clone());
                right = mid as i64 - 1;
            }
        }

        result.regression_found = result.last_good.is_some() && result.first_bad.is_some();
        if let (Some(good), Some(bad)) = (&result.last_good, &result.first_bad) {
            result.diff_command = Some(format!("git diff {}..{}", good.hash, bad.hash));
        }
        result
    }
}

/// Test a single commit in isolation: checkout, evaluate once, restore.
/// `None` means the checkout failed.
pub fn check_commit(
    workspace: &mut dyn Workspace,
    oracle: &dyn Oracle,
    commit: &mut CommitRecord,
) -> Option<bool> {
    let verdict = if workspace.checkout(&commit.hash) {
        let passed = oracle.evaluate(commit);
        commit.test_result = Some(passed);
        Some(passed)
    } else {
        None
    };
    if !workspace.restore() {
        tracing::warn!("could not restore original checkout after commit check");
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FnOracle;
    use time::OffsetDateTime;

    /// Scripted stand-in for a real working tree.
    struct FakeTree {
        checked_out: Vec<String>,
        fail_on: Option<String>,
        restore_calls: usize,
    }

    impl FakeTree {
        fn new() -> Self {
            Self {
                checked_out: Vec::new(),
                fail_on: None,
                restore_calls: 0,
            }
        }

        fn failing_on(hash: &str) -> Self {
            Self {
                fail_on: Some(hash.to_string()),
                ..Self::new()
            }
        }
    }

    impl Workspace for FakeTree {
        fn checkout(&mut self, hash: &str) -> bool {
            if self.fail_on.as_deref() == Some(hash) {
                return false;
            }
            self.checked_out.push(hash.to_string());
            true
        }

        fn restore(&mut self) -> bool {
            self.restore_calls += 1;
            true
        }
    }

    fn synthetic_commits(n: usize) -> Vec<CommitRecord> {
        (0..n)
            .map(|i| CommitRecord {
                hash: format!("{i:040x}"),
                index: i,
                total: n,
                timestamp: OffsetDateTime::from_unix_timestamp(1_700_000_000 + i as i64 * 3600)
                    .unwrap(),
                test_result: None,
            })
            .collect()
    }

    /// Oracle that passes exactly the commits with index < boundary.
    fn boundary_oracle(boundary: usize) -> FnOracle<impl Fn(&CommitRecord) -> bool> {
        FnOracle::new("synthetic boundary", move |c: &CommitRecord| c.index < boundary)
    }

    fn max_tests(n: usize) -> usize {
        (n as f64).log2().ceil() as usize + 1
    }

    #[test]
    fn boundary_at_midpoint() {
        // 8 commits, indices 0-3 good, 4-7 bad.
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(4);
        let result = BisectionEngine::new(&mut tree, &oracle).run(synthetic_commits(8));

        assert_eq!(result.last_good.as_ref().unwrap().index, 3);
        assert_eq!(result.first_bad.as_ref().unwrap().index, 4);
        assert!(result.regression_found);
        assert_eq!(result.tests_run, 3);
        assert!(result.diff_command.as_ref().unwrap().starts_with("git diff "));
        assert_eq!(tree.restore_calls, 1);
    }

    #[test]
    fn finds_every_boundary_within_the_log_bound() {
        for n in 1..=64 {
            for boundary in 0..=n {
                let mut tree = FakeTree::new();
                let oracle = boundary_oracle(boundary);
                let result = BisectionEngine::new(&mut tree, &oracle).run(synthetic_commits(n));

                if boundary == 0 {
                    assert!(result.last_good.is_none(), "n={n} b={boundary}");
                    assert_eq!(result.first_bad.unwrap().index, 0, "n={n} b={boundary}");
                } else if boundary == n {
                    assert_eq!(
                        result.last_good.unwrap().index,
                        n - 1,
                        "n={n} b={boundary}"
                    );
                    assert!(result.first_bad.is_none(), "n={n} b={boundary}");
                } else {
                    assert_eq!(
                        result.last_good.as_ref().unwrap().index,
                        boundary - 1,
                        "n={n} b={boundary}"
                    );
                    assert_eq!(
                        result.first_bad.as_ref().unwrap().index,
                        boundary,
                        "n={n} b={boundary}"
                    );
                }
                assert!(
                    result.tests_run <= max_tests(n),
                    "n={n} b={boundary}: {} tests > bound {}",
                    result.tests_run,
                    max_tests(n)
                );
                assert_eq!(tree.restore_calls, 1);
            }
        }
    }

    #[test]
    fn empty_window_is_a_noop() {
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(0);
        let result = BisectionEngine::new(&mut tree, &oracle).run(Vec::new());

        assert_eq!(result.total_commits, 0);
        assert_eq!(result.tests_run, 0);
        assert!(!result.regression_found);
        assert!(tree.checked_out.is_empty());
        assert_eq!(tree.restore_calls, 1);
    }

    #[test]
    fn all_good_means_no_regression_in_range() {
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(10);
        let result = BisectionEngine::new(&mut tree, &oracle).run(synthetic_commits(10));

        assert!(!result.regression_found);
        assert_eq!(result.last_good.unwrap().index, 9);
        assert!(result.first_bad.is_none());
        assert!(result.diff_command.is_none());
    }

    #[test]
    fn all_bad_means_regression_predates_window() {
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(0);
        let result = BisectionEngine::new(&mut tree, &oracle).run(synthetic_commits(10));

        assert!(!result.regression_found);
        assert!(result.last_good.is_none());
        assert_eq!(result.first_bad.unwrap().index, 0);
    }

    #[test]
    fn single_broken_commit() {
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(0);
        let result = BisectionEngine::new(&mut tree, &oracle).run(synthetic_commits(1));

        assert_eq!(result.tests_run, 1);
        assert!(result.last_good.is_none());
        assert_eq!(result.first_bad.unwrap().index, 0);
    }

    #[test]
    fn checkout_failure_aborts_but_still_restores() {
        let commits = synthetic_commits(8);
        // First probe lands on index 3; make that checkout fail.
        let mut tree = FakeTree::failing_on(&commits[3].hash);
        let oracle = boundary_oracle(4);
        let result = BisectionEngine::new(&mut tree, &oracle).run(commits);

        assert!(result.aborted.is_some());
        assert_eq!(result.tests_run, 0);
        assert!(!result.regression_found);
        assert_eq!(tree.restore_calls, 1);
    }

    #[test]
    fn check_commit_restores_after_single_test() {
        let mut commits = synthetic_commits(3);
        let mut tree = FakeTree::new();
        let oracle = boundary_oracle(2);

        let verdict = check_commit(&mut tree, &oracle, &mut commits[1]);
        assert_eq!(verdict, Some(true));
        assert_eq!(commits[1].test_result, Some(true));
        assert_eq!(tree.restore_calls, 1);

        let mut failing = FakeTree::failing_on(&commits[0].hash);
        let verdict = check_commit(&mut failing, &oracle, &mut commits[0]);
        assert_eq!(verdict, None);
        assert_eq!(failing.restore_calls, 1);
    }
}
