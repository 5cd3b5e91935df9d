use culprit_core::{oracle, BisectionEngine, CommitTimeline, HuntConfig, WorkspaceCheckout};
use culprit_session::{CulpritPaths, RepoLock};
use std::path::Path;

pub fn execute(repo_root: &Path, days: u64, pattern: Option<&str>) -> anyhow::Result<()> {
    let config = HuntConfig::load(repo_root);
    let commits = CommitTimeline::new(repo_root).resolve(days)?;
    if commits.is_empty() {
        println!("No commits in the last {days} day(s); nothing to bisect.");
        return Ok(());
    }

    let paths = CulpritPaths::discover(repo_root);
    paths.ensure_layout()?;
    let _lock = RepoLock::acquire(&paths)?;

    let oracle = oracle::for_pattern(&config, repo_root, pattern);
    println!(
        "Bisecting {} commit(s) from the last {days} day(s) with oracle: {}",
        commits.len(),
        oracle.describe()
    );

    let mut workspace = WorkspaceCheckout::new(repo_root);
    let result = BisectionEngine::new(&mut workspace, oracle.as_ref()).run(commits);

    if let Some(reason) = &result.aborted {
        anyhow::bail!(
            "bisection aborted after {} test(s): {reason}",
            result.tests_run
        );
    }

    println!("Ran {} test(s) over {} commit(s).", result.tests_run, result.total_commits);
    match (&result.last_good, &result.first_bad) {
        (Some(good), Some(bad)) => {
            println!("Last good:  {} ({})", good.short_hash(), good.timestamp);
            println!("First bad:  {} ({})", bad.short_hash(), bad.timestamp);
            println!("The regression landed between these two commits.");
            if let Some(diff) = &result.diff_command {
                println!("Inspect with: {diff}");
            }
        }
        (Some(_), None) => {
            println!("The feature works across the whole window; no regression in range.");
        }
        (None, Some(_)) => {
            println!("The feature is broken across the whole window; try a larger --days.");
        }
        (None, None) => println!("No tests were run."),
    }
    Ok(())
}
