use culprit_core::CommitTimeline;
use std::path::Path;

pub fn execute(repo_root: &Path, days: u64) -> anyhow::Result<()> {
    let commits = CommitTimeline::new(repo_root).resolve(days)?;
    if commits.is_empty() {
        println!("No commits in the last {days} day(s).");
        return Ok(());
    }
    println!("{} commit(s) in the last {days} day(s), oldest first:", commits.len());
    for commit in &commits {
        println!("  [{}] {} {}", commit.index, commit.short_hash(), commit.timestamp);
    }
    Ok(())
}
