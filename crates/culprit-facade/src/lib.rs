//! One dispatch surface, three calling conventions.
//!
//! Callers can construct core/session objects directly, go through
//! [`Facade::execute`] with a tool name and JSON parameters, or hand
//! [`Facade::parse`] a free-text command. All three produce the same
//! [`Outcome`] shape for equivalent inputs; the facade adapts, it never
//! adds logic of its own.

pub mod outcome;
pub mod parse;
pub mod registry;
pub mod request;

pub use outcome::Outcome;
pub use parse::CommandParser;
pub use registry::{Facade, Registry};
pub use request::{
    BranchCleanupRequest, BranchCreateRequest, CheckCommitRequest, HuntRegressionRequest,
    ListCommitsRequest, MarkResolvedRequest, RecordTestRequest,
};
