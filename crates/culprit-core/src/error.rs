use thiserror::Error;

/// Failures at the version-control layer. These are the only errors that
/// abort an operation outright; oracle ambiguity is normalized to `false`
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("`{command}` did not finish within {timeout_secs}s")]
    TimedOut { command: String, timeout_secs: u64 },

    #[error("unexpected output from `{command}`: {detail}")]
    Parse { command: String, detail: String },
}
