//! Error taxonomy for the mutation surface.
//!
//! Only caller-request problems are errors. Pre-existing document defects
//! (dangling edges, cycles already on disk) are classifications handled by
//! the validator and repair pass, never `Err` values.

use crate::refs::{RefParseError, TaskRef};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// A textual address did not parse.
    #[error(transparent)]
    Parse(#[from] RefParseError),

    /// An address did not resolve to an existing task or subtask.
    #[error("no task or subtask at '{0}'")]
    NotFound(TaskRef),

    /// The request itself is nonsensical (self-dependency, demoting a task
    /// under itself, and so on).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The requested dependency was rejected because it would close a cycle.
    #[error("dependency {from} -> {to} would create a cycle")]
    WouldCreateCycle { from: TaskRef, to: TaskRef },

    /// The document is structurally broken in a way repair cannot fix.
    #[error("malformed document: {0}")]
    MalformedDocument(String),
}
