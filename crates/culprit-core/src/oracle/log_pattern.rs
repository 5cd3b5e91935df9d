use crate::oracle::Oracle;
use crate::timeline::CommitRecord;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Case-sensitive substring search of the service log.
///
/// Checking out a commit triggers an external restart of the service under
/// test, so the oracle polls the log up to a grace deadline instead of
/// reading it once: it answers `true` as soon as the pattern shows up and
/// `false` only when the deadline passes. A missing log file counts as
/// "not yet restarted", not as an error.
pub struct LogPatternOracle {
    log_file: PathBuf,
    pattern: String,
    grace: Duration,
    poll_interval: Duration,
}

impl LogPatternOracle {
    pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

    pub fn new(log_file: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            log_file: log_file.into(),
            pattern: pattern.into(),
            grace: Self::DEFAULT_GRACE,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_grace(mut self, grace: Duration, poll_interval: Duration) -> Self {
        self.grace = grace;
        self.poll_interval = poll_interval.max(Duration::from_millis(10));
        self
    }
}

impl Oracle for LogPatternOracle {
    fn evaluate(&self, _commit: &CommitRecord) -> bool {
        let deadline = Instant::now() + self.grace;
        loop {
            if let Ok(content) = std::fs::read_to_string(&self.log_file) {
                if content.contains(&self.pattern) {
                    return true;
                }
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval.min(deadline - now));
        }
    }

    fn describe(&self) -> String {
        format!(
            "log-pattern \"{}\" in {}",
            self.pattern,
            self.log_file.display()
        )
    }
}
