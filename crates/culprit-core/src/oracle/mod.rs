//! Pluggable boolean tests run against the currently checked-out commit.
//!
//! Every built-in oracle treats ambiguity (missing file, network error,
//! unreadable database) as `false` rather than raising, so one flaky probe
//! cannot abort an otherwise deterministic bisection. Only checkout
//! failures are fatal, and those live at the VCS layer.

pub mod http_status;
pub mod log_pattern;
pub mod table_exists;

pub use http_status::HttpStatusOracle;
pub use log_pattern::LogPatternOracle;
pub use table_exists::TableExistsOracle;

use crate::config::HuntConfig;
use crate::timeline::CommitRecord;
use std::path::Path;

/// Pattern prefix that selects the relational oracle: `table:<name>`
/// checks for a database table instead of a log substring.
pub const TABLE_PREFIX: &str = "table:";

/// A boolean verdict on one commit: does the feature work here?
pub trait Oracle {
    fn evaluate(&self, commit: &CommitRecord) -> bool;

    /// Short human-readable label for logs and results.
    fn describe(&self) -> String;
}

/// Build the oracle a pattern argument asks for. `table:<name>` selects
/// the relational oracle, any other pattern the log oracle, and no
/// pattern at all the HTTP health probe from the config.
pub fn for_pattern(
    config: &HuntConfig,
    repo_root: &Path,
    pattern: Option<&str>,
) -> Box<dyn Oracle> {
    match pattern {
        Some(p) => match p.strip_prefix(TABLE_PREFIX) {
            Some(table) => Box::new(TableExistsOracle::new(config.db_path(repo_root), table)),
            None => Box::new(
                LogPatternOracle::new(config.log_path(repo_root), p)
                    .with_grace(config.grace(), config.poll_interval()),
            ),
        },
        None => Box::new(HttpStatusOracle::new(
            config.http_url.clone(),
            config.http_expect_status,
        )),
    }
}

/// Wraps a caller-supplied predicate as an oracle.
pub struct FnOracle<F>
where
    F: Fn(&CommitRecord) -> bool,
{
    predicate: F,
    label: String,
}

impl<F> FnOracle<F>
where
    F: Fn(&CommitRecord) -> bool,
{
    pub fn new(label: impl Into<String>, predicate: F) -> Self {
        Self {
            predicate,
            label: label.into(),
        }
    }
}

impl<F> Oracle for FnOracle<F>
where
    F: Fn(&CommitRecord) -> bool,
{
    fn evaluate(&self, commit: &CommitRecord) -> bool {
        (self.predicate)(commit)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}
