pub mod lock;
pub mod manager;
pub mod paths;
pub mod store;

pub use lock::RepoLock;
pub use manager::{BranchSummary, CleanupReport, HuntManager, NoActiveSession};
pub use paths::CulpritPaths;
pub use store::{Finding, HuntSession, SessionStore, StoreError, TestEntry, WarStory};
