mod cmd_branch;
mod cmd_check;
mod cmd_commits;
mod cmd_exec;
mod cmd_hunt;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "culprit",
    version,
    about = "Binary-search your git history for the commit that broke a feature"
)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bisect the last N days of history for a regression
    Hunt {
        /// Size of the trailing search window, in days
        #[arg(long)]
        days: u64,
        /// Log substring that marks the feature as working; omit to probe
        /// the configured HTTP health endpoint instead. Prefix with
        /// "table:" to check for a database table.
        #[arg(long)]
        pattern: Option<String>,
    },
    /// List the commits inside a trailing window, oldest first
    Commits {
        /// Size of the window, in days
        #[arg(long)]
        days: u64,
    },
    /// Test a single commit against an oracle
    Check {
        /// Commit hash (or any ref git resolves)
        #[arg(long)]
        hash: String,
        /// Oracle pattern, same syntax as `hunt --pattern`
        #[arg(long)]
        pattern: String,
    },
    /// Manage isolated hunt branches
    Branch {
        #[command(subcommand)]
        cmd: BranchCommand,
    },
    /// Run a free-text command through the facade grammar
    Exec {
        /// Command text, e.g. "hunt_regression 7 search ready"
        #[arg(last = true)]
        command: Vec<String>,
    },
}

#[derive(Subcommand)]
enum BranchCommand {
    /// Open a new hunt branch
    Create {
        /// What broke, in your own words
        #[arg(long, default_value = "")]
        description: String,
    },
    /// List hunt branches with their session metadata
    List,
    /// Record a tested commit on the active hunt branch
    Record {
        #[arg(long)]
        commits_ago: u64,
        /// Did the feature work at that commit?
        #[arg(long)]
        passed: bool,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark the active hunt resolved
    Resolve {
        /// Closing finding for the war story
        #[arg(long)]
        finding: Option<String>,
    },
    /// Delete resolved hunt branches, archiving their war stories
    Cleanup {
        /// Delete unresolved hunts too
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let repo_root = std::env::current_dir()?;

    match cli.cmd {
        Command::Hunt { days, pattern } => cmd_hunt::execute(&repo_root, days, pattern.as_deref()),
        Command::Commits { days } => cmd_commits::execute(&repo_root, days),
        Command::Check { hash, pattern } => cmd_check::execute(&repo_root, &hash, &pattern),
        Command::Branch { cmd } => match cmd {
            BranchCommand::Create { description } => cmd_branch::create(&repo_root, &description),
            BranchCommand::List => cmd_branch::list(&repo_root),
            BranchCommand::Record {
                commits_ago,
                passed,
                notes,
            } => cmd_branch::record(&repo_root, commits_ago, passed, notes.as_deref()),
            BranchCommand::Resolve { finding } => {
                cmd_branch::resolve(&repo_root, finding.as_deref())
            }
            BranchCommand::Cleanup { force } => cmd_branch::cleanup(&repo_root, force),
        },
        Command::Exec { command } => cmd_exec::execute(&repo_root, &command.join(" ")),
    }
}
