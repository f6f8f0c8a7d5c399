//! Structural mutators.
//!
//! Every operation here validates its addresses up front, performs the edit,
//! and then runs the repair pass before returning, so the document never
//! leaves the engine with a broken graph even when the edit itself created
//! collateral damage (deleting a subtask someone else depended on, say).
//! Caller mistakes fail loudly; error paths leave the document untouched.

use crate::document::{Document, Subtask, Task};
use crate::error::EngineError;
use crate::refs::TaskRef;
use crate::repair::repair;
use crate::validate::creates_cycle;

/// What to do with a subtask being removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveMode {
    /// Delete the node; edges referencing it are pruned by the repair pass.
    Delete,
    /// Promote it to a top-level task instead of deleting it.
    Convert,
}

/// Add a dependency edge `from -> to`.
///
/// Rejects a self-reference (`InvalidOperation`) and an edge that would
/// close a cycle (`WouldCreateCycle`, with the document left unchanged --
/// creating a known-bad edge and immediately erasing it would surprise the
/// caller). Adding an edge that is already present is a quiet no-op.
pub fn add_dependency(doc: &mut Document, from: TaskRef, to: TaskRef) -> Result<(), EngineError> {
    if !doc.contains(&from) {
        return Err(EngineError::NotFound(from));
    }
    if !doc.contains(&to) {
        return Err(EngineError::NotFound(to));
    }
    if from == to {
        return Err(EngineError::InvalidOperation(format!(
            "node {} cannot depend on itself",
            from
        )));
    }
    if doc.deps_of(&from).is_some_and(|deps| deps.contains(&to)) {
        tracing::debug!(from = %from, to = %to, "dependency already present");
        repair(doc);
        return Ok(());
    }
    if creates_cycle(doc, from, to) {
        return Err(EngineError::WouldCreateCycle { from, to });
    }
    if let Some(deps) = doc.deps_of_mut(&from) {
        deps.push(to);
    }
    repair(doc);
    Ok(())
}

/// Remove the dependency edge `from -> to`.
///
/// Returns whether an edge was actually removed; an absent edge is a no-op,
/// not an error.
pub fn remove_dependency(
    doc: &mut Document,
    from: TaskRef,
    to: TaskRef,
) -> Result<bool, EngineError> {
    let Some(deps) = doc.deps_of_mut(&from) else {
        return Err(EngineError::NotFound(from));
    };
    let removed = deps.remove(&to);
    if !removed {
        tracing::debug!(from = %from, to = %to, "dependency not present, nothing to remove");
    }
    repair(doc);
    Ok(removed)
}

/// Promote subtask `parent.sub_id` to a standalone task.
///
/// The new task takes `max existing task id + 1`, inherits the parent's
/// priority, and keeps the subtask's dependencies as-is (they are absolute
/// addresses). Every other node that referenced `parent.sub_id` is rewritten
/// to reference the new task id. Returns the new id.
pub fn promote_subtask_to_task(
    doc: &mut Document,
    parent: u64,
    sub_id: u64,
) -> Result<u64, EngineError> {
    let priority = doc
        .task(parent)
        .ok_or(EngineError::NotFound(TaskRef::Task(parent)))?
        .priority;
    let new_id = doc.next_task_id();
    let sub = detach_subtask(doc, parent, sub_id)
        .ok_or(EngineError::NotFound(TaskRef::Subtask(parent, sub_id)))?;

    doc.tasks.push(Task {
        id: new_id,
        title: sub.title,
        description: sub.description,
        details: sub.details.unwrap_or_default(),
        test_strategy: String::new(),
        status: sub.status,
        priority,
        dependencies: sub.dependencies,
        subtasks: Vec::new(),
    });
    let rewritten = doc.rewrite_refs(&TaskRef::Subtask(parent, sub_id), TaskRef::Task(new_id));
    tracing::debug!(
        old = %TaskRef::Subtask(parent, sub_id),
        new = new_id,
        rewritten,
        "promoted subtask to task"
    );
    repair(doc);
    Ok(new_id)
}

/// Demote task `task_id` to a subtask of `parent_id` (inverse of promote).
///
/// Allocates the next unused subtask id under the parent and rewrites every
/// reference to the old task id. Rejects a parent inside the subtree being
/// moved (the task itself) and a task that still has subtasks of its own,
/// since the model cannot nest. Returns the new subtask id.
pub fn convert_task_to_subtask(
    doc: &mut Document,
    task_id: u64,
    parent_id: u64,
) -> Result<u64, EngineError> {
    if task_id == parent_id {
        return Err(EngineError::InvalidOperation(format!(
            "cannot convert task {} into a subtask of itself",
            task_id
        )));
    }
    let task = doc
        .task(task_id)
        .ok_or(EngineError::NotFound(TaskRef::Task(task_id)))?;
    if !task.subtasks.is_empty() {
        return Err(EngineError::InvalidOperation(format!(
            "task {} still has subtasks; promote or clear them first",
            task_id
        )));
    }
    if doc.task(parent_id).is_none() {
        return Err(EngineError::NotFound(TaskRef::Task(parent_id)));
    }

    // Checks passed; detach and move. remove_task cannot fail here.
    let Some(task) = doc.remove_task(task_id) else {
        return Err(EngineError::NotFound(TaskRef::Task(task_id)));
    };
    let parent = match doc.task_mut(parent_id) {
        Some(p) => p,
        None => return Err(EngineError::NotFound(TaskRef::Task(parent_id))),
    };
    let new_sub = parent.next_subtask_id();
    parent.subtasks.push(Subtask {
        id: new_sub,
        title: task.title,
        description: task.description,
        details: (!task.details.is_empty()).then_some(task.details),
        status: task.status,
        dependencies: task.dependencies,
    });
    let rewritten = doc.rewrite_refs(&TaskRef::Task(task_id), TaskRef::Subtask(parent_id, new_sub));
    tracing::debug!(
        old = task_id,
        new = %TaskRef::Subtask(parent_id, new_sub),
        rewritten,
        "converted task to subtask"
    );
    repair(doc);
    Ok(new_sub)
}

/// Remove subtask `parent.sub_id`.
///
/// `Delete` drops the node and lets the trailing repair pass prune edges
/// that referenced it. `Convert` promotes it instead and returns the new
/// task id.
pub fn remove_subtask(
    doc: &mut Document,
    parent: u64,
    sub_id: u64,
    mode: RemoveMode,
) -> Result<Option<u64>, EngineError> {
    match mode {
        RemoveMode::Convert => promote_subtask_to_task(doc, parent, sub_id).map(Some),
        RemoveMode::Delete => {
            if doc.task(parent).is_none() {
                return Err(EngineError::NotFound(TaskRef::Task(parent)));
            }
            if detach_subtask(doc, parent, sub_id).is_none() {
                return Err(EngineError::NotFound(TaskRef::Subtask(parent, sub_id)));
            }
            repair(doc);
            Ok(None)
        }
    }
}

/// Remove all subtasks of `task_id`. Returns how many were removed.
///
/// Edges elsewhere in the document that referenced those subtasks become
/// dangling and are pruned by the trailing repair pass.
pub fn clear_subtasks(doc: &mut Document, task_id: u64) -> Result<usize, EngineError> {
    let task = doc
        .task_mut(task_id)
        .ok_or(EngineError::NotFound(TaskRef::Task(task_id)))?;
    let removed = task.subtasks.len();
    task.subtasks.clear();
    repair(doc);
    Ok(removed)
}

fn detach_subtask(doc: &mut Document, parent: u64, sub_id: u64) -> Option<Subtask> {
    let task = doc.task_mut(parent)?;
    let pos = task.subtasks.iter().position(|s| s.id == sub_id)?;
    Some(task.subtasks.remove(pos))
}
