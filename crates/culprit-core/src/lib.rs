pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod oracle;
pub mod timeline;

pub use checkout::{Workspace, WorkspaceCheckout};
pub use config::HuntConfig;
pub use engine::{check_commit, BisectionEngine, BisectionResult};
pub use error::VcsError;
pub use oracle::Oracle;
pub use timeline::{now_rfc3339, CommitRecord, CommitTimeline};
