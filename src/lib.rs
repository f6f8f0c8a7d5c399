//! # taskgraph
//!
//! Structural consistency engine for a project's work-breakdown document:
//! tasks, their subtasks, and the dependency edges between them. External
//! editors (AI generation, interactive tooling, concurrent writers) can leave
//! the graph with self-references, dangling references, and cycles; this
//! crate classifies those defects, repairs them deterministically, and keeps
//! the invariants intact across structural edits.
//!
//! The engine is synchronous and stateless between calls: every operation
//! takes the document as an explicit value, mutates it in place, and runs the
//! repair pass before returning.
//!
//! ```
//! use taskgraph::{add_dependency, repair, Document, Task, TaskRef};
//!
//! let mut doc = Document::new(vec![Task::new(1, "design"), Task::new(2, "build")]);
//! add_dependency(&mut doc, TaskRef::Task(2), TaskRef::Task(1))?;
//! assert!(!repair(&mut doc)); // mutators leave the graph consistent
//! # Ok::<(), taskgraph::EngineError>(())
//! ```
//!
//! ## Modules
//! - `document`: the serde model for the backing JSON document
//! - `refs`: typed task/subtask references and parsing
//! - `validate`: per-edge classification (valid / self-loop / dangling / cyclic)
//! - `repair`: invariant restoration by pruning invalid edges
//! - `ops`: structural mutators (dependencies, promote/demote, removal)
//! - `status`: status bookkeeping on individual nodes
//! - `store`: whole-file JSON persistence with atomic replace

pub mod document;
pub mod error;
pub mod ops;
pub mod refs;
pub mod repair;
pub mod status;
pub mod store;
pub mod validate;

pub use document::{DependencyList, Document, Priority, Subtask, Task, TaskStatus};
pub use error::EngineError;
pub use ops::{
    add_dependency, clear_subtasks, convert_task_to_subtask, promote_subtask_to_task,
    remove_dependency, remove_subtask, RemoveMode,
};
pub use refs::{RefParseError, TaskRef};
pub use repair::{repair, repair_with, LogSink, RemovalReason, RepairAction, RepairSink};
pub use status::{set_status, set_status_many};
pub use store::{load_document, save_document, StoreError};
pub use validate::{classify, creates_cycle, EdgeReport, EdgeVerdict};
