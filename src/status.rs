//! Status bookkeeping on individual nodes.
//!
//! There is no transition table: the document records facts, not a workflow,
//! so any status may move to any other. Setting a status touches only the
//! addressed node; it never cascades to dependents, dependencies, or
//! parent/child nodes.

use crate::document::{Document, TaskStatus};
use crate::error::EngineError;
use crate::refs::TaskRef;

/// Set the status of one task or subtask.
pub fn set_status(
    doc: &mut Document,
    addr: TaskRef,
    status: TaskStatus,
) -> Result<(), EngineError> {
    match addr {
        TaskRef::Task(id) => {
            let task = doc.task_mut(id).ok_or(EngineError::NotFound(addr))?;
            task.status = status;
        }
        TaskRef::Subtask(parent, sub) => {
            let subtask = doc
                .subtask_mut(parent, sub)
                .ok_or(EngineError::NotFound(addr))?;
            subtask.status = status;
        }
    }
    tracing::debug!(node = %addr, status = %status, "set status");
    Ok(())
}

/// Batch convenience over [`set_status`], one address per underlying call.
///
/// Each address succeeds or fails independently; one bad address does not
/// abort the rest of the batch.
pub fn set_status_many(
    doc: &mut Document,
    addrs: &[TaskRef],
    status: TaskStatus,
) -> Vec<(TaskRef, Result<(), EngineError>)> {
    addrs
        .iter()
        .map(|addr| (*addr, set_status(doc, *addr, status)))
        .collect()
}
