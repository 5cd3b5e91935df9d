//! Thin runner for the `git` CLI. Every call captures output, carries a
//! deadline, and folds stderr into the returned error.

use crate::error::VcsError;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// Default deadline for a single git invocation.
pub const GIT_TIMEOUT: Duration = Duration::from_secs(30);

const KILL_POLL: Duration = Duration::from_millis(20);

/// Run `git <args>` in `repo_root` with the default deadline and return
/// trimmed stdout.
pub fn run_git(repo_root: &Path, args: &[&str]) -> Result<String, VcsError> {
    run_git_with_timeout(repo_root, args, GIT_TIMEOUT)
}

/// Run `git <args>` in `repo_root`, killing the process if it does not exit
/// within `timeout`.
pub fn run_git_with_timeout(
    repo_root: &Path,
    args: &[&str],
    timeout: Duration,
) -> Result<String, VcsError> {
    let command = format!("git {}", args.join(" "));

    let mut child = Command::new("git")
        .args(args)
        .current_dir(repo_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| VcsError::Launch {
            command: command.clone(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(VcsError::TimedOut {
                        command,
                        timeout_secs: timeout.as_secs(),
                    });
                }
                std::thread::sleep(KILL_POLL);
            }
            Err(source) => {
                let _ = child.kill();
                return Err(VcsError::Launch { command, source });
            }
        }
    }

    let output = child.wait_with_output().map_err(|source| VcsError::Launch {
        command: command.clone(),
        source,
    })?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim_end().to_string())
    } else {
        Err(VcsError::CommandFailed {
            command,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
