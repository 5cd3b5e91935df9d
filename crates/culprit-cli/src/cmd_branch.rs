use culprit_core::HuntConfig;
use culprit_session::HuntManager;
use std::path::Path;

fn open_manager(repo_root: &Path) -> anyhow::Result<HuntManager> {
    let config = HuntConfig::load(repo_root);
    HuntManager::open(repo_root, config.fallback_branch)
}

pub fn create(repo_root: &Path, description: &str) -> anyhow::Result<()> {
    let mut manager = open_manager(repo_root)?;
    let session = manager.create(description)?;
    println!("Opened hunt branch {}", session.branch_name);
    if !session.issue_description.is_empty() {
        println!("  issue: {}", session.issue_description);
    }
    Ok(())
}

pub fn list(repo_root: &Path) -> anyhow::Result<()> {
    let manager = open_manager(repo_root)?;
    let branches = manager.list()?;
    if branches.is_empty() {
        println!("No hunt branches.");
        return Ok(());
    }
    for b in &branches {
        let status = match b.resolved {
            Some(true) => "resolved",
            Some(false) => "open",
            None => "unknown",
        };
        println!(
            "{}  [{}] created {} tests {}  {}",
            b.branch_name, status, b.created_at, b.commits_tested, b.issue_description
        );
    }
    Ok(())
}

pub fn record(
    repo_root: &Path,
    commits_ago: u64,
    passed: bool,
    notes: Option<&str>,
) -> anyhow::Result<()> {
    let manager = open_manager(repo_root)?;
    manager.record_test(commits_ago, passed, notes)?;
    println!(
        "Recorded: {} commits ago, feature {}",
        commits_ago,
        if passed { "working" } else { "broken" }
    );
    Ok(())
}

pub fn resolve(repo_root: &Path, finding: Option<&str>) -> anyhow::Result<()> {
    let manager = open_manager(repo_root)?;
    manager.mark_resolved(finding)?;
    println!("Marked resolved.");
    Ok(())
}

pub fn cleanup(repo_root: &Path, force: bool) -> anyhow::Result<()> {
    let mut manager = open_manager(repo_root)?;
    let report = manager.cleanup(force)?;
    println!(
        "Deleted {} branch(es), archived {} war stor{}; back on {}.",
        report.deleted_branches,
        report.stories_extracted,
        if report.stories_extracted == 1 { "y" } else { "ies" },
        report.restored_to
    );
    for failure in &report.failures {
        eprintln!("warning: {failure}");
    }
    Ok(())
}
