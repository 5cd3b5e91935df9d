use culprit_core::{check_commit, oracle, CommitTimeline, HuntConfig, WorkspaceCheckout};
use culprit_session::{CulpritPaths, RepoLock};
use std::path::Path;

pub fn execute(repo_root: &Path, hash: &str, pattern: &str) -> anyhow::Result<()> {
    let config = HuntConfig::load(repo_root);
    let mut commit = CommitTimeline::new(repo_root).lookup(hash)?;
    let oracle = oracle::for_pattern(&config, repo_root, Some(pattern));

    let paths = CulpritPaths::discover(repo_root);
    paths.ensure_layout()?;
    let _lock = RepoLock::acquire(&paths)?;

    let mut workspace = WorkspaceCheckout::new(repo_root);
    match check_commit(&mut workspace, oracle.as_ref(), &mut commit) {
        Some(true) => println!("{}: feature present ({})", commit.short_hash(), oracle.describe()),
        Some(false) => println!("{}: feature absent ({})", commit.short_hash(), oracle.describe()),
        None => anyhow::bail!("checkout failed for {}", commit.hash),
    }
    Ok(())
}
