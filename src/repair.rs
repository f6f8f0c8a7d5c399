//! Graph repair: prune invalid edges until the invariants hold again.
//!
//! Repair never fails and never deletes a node. It can always produce a
//! valid document because deleting edges is its entire job: self-loops,
//! dangling refs and cycle-closing edges are removed one ref at a time,
//! malformed dependency fields are normalized, and legacy sibling references
//! are migrated to explicit `parent.sub` form. Callers get a `changed` flag
//! back to decide whether the document needs persisting.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::document::Document;
use crate::refs::TaskRef;
use crate::validate::{classify, EdgeVerdict};

/// Why an edge was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalReason {
    SelfLoop,
    Dangling,
    Cyclic,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RemovalReason::SelfLoop => "self-loop",
            RemovalReason::Dangling => "dangling",
            RemovalReason::Cyclic => "cyclic",
        })
    }
}

/// One thing the repair pass did to the document.
#[derive(Debug, Clone, PartialEq)]
pub enum RepairAction {
    /// Removed a single dependency ref from `node`'s list.
    RemovedEdge {
        node: TaskRef,
        removed: TaskRef,
        reason: RemovalReason,
    },
    /// Dropped a dependency entry that never parsed as a reference.
    DroppedInvalidEntry { node: TaskRef, entry: Value },
    /// Replaced a non-list `dependencies` field with an empty list.
    NormalizedDependencies { node: TaskRef },
    /// Rewrote a legacy bare-integer sibling reference to explicit form.
    RewroteSiblingRef {
        node: TaskRef,
        old: TaskRef,
        new: TaskRef,
    },
}

/// Diagnostic sink for repair actions.
///
/// The engine works fine without one; [`repair`] routes actions to the log.
pub trait RepairSink {
    fn record(&mut self, action: RepairAction);
}

impl RepairSink for Vec<RepairAction> {
    fn record(&mut self, action: RepairAction) {
        self.push(action);
    }
}

/// Sink that reports each action through `tracing`.
#[derive(Debug, Default)]
pub struct LogSink;

impl RepairSink for LogSink {
    fn record(&mut self, action: RepairAction) {
        match action {
            RepairAction::RemovedEdge {
                node,
                removed,
                reason,
            } => {
                tracing::warn!(node = %node, removed = %removed, reason = %reason, "pruned dependency edge");
            }
            RepairAction::DroppedInvalidEntry { node, entry } => {
                tracing::warn!(node = %node, entry = %entry, "dropped unparseable dependency entry");
            }
            RepairAction::NormalizedDependencies { node } => {
                tracing::warn!(node = %node, "normalized non-list dependencies field");
            }
            RepairAction::RewroteSiblingRef { node, old, new } => {
                tracing::warn!(node = %node, old = %old, new = %new, "migrated legacy sibling reference");
            }
        }
    }
}

/// Repair the document in place, logging each action.
pub fn repair(doc: &mut Document) -> bool {
    repair_with(doc, &mut LogSink)
}

/// Repair the document in place, reporting each action to `sink`.
///
/// Returns `true` iff anything was altered. Idempotent: a second run on an
/// unchanged document alters nothing and returns `false`.
pub fn repair_with(doc: &mut Document, sink: &mut impl RepairSink) -> bool {
    let mut changed = false;
    changed |= normalize(doc, sink);
    changed |= migrate_sibling_refs(doc, sink);
    changed |= prune_edges(doc, sink);
    changed
}

/// Clear malformed dependency fields and drop entries that never parsed.
fn normalize(doc: &mut Document, sink: &mut impl RepairSink) -> bool {
    let mut changed = false;
    doc.for_each_deps_mut(|node, deps| {
        if deps.is_malformed() {
            deps.clear_malformed();
            sink.record(RepairAction::NormalizedDependencies { node });
            changed = true;
        }
        for entry in deps.take_invalid() {
            sink.record(RepairAction::DroppedInvalidEntry { node, entry });
            changed = true;
        }
    });
    changed
}

/// One-time migration for legacy documents that referenced sibling subtasks
/// by bare integer.
///
/// A task ref inside a subtask's list is rewritten to `parent.sub` form only
/// when it does not resolve as a task but does match a sibling subtask id.
/// When both a task and a sibling exist the ref is ambiguous and kept as a
/// task ref rather than silently guessing.
fn migrate_sibling_refs(doc: &mut Document, sink: &mut impl RepairSink) -> bool {
    let task_ids: HashSet<u64> = doc.tasks.iter().map(|t| t.id).collect();
    let mut changed = false;
    for task in &mut doc.tasks {
        let parent = task.id;
        let sibling_ids: HashSet<u64> = task.subtasks.iter().map(|s| s.id).collect();
        for sub in &mut task.subtasks {
            let own = sub.id;
            for r in sub.dependencies.refs_mut() {
                let TaskRef::Task(n) = *r else { continue };
                if !task_ids.contains(&n) && sibling_ids.contains(&n) && n != own {
                    let new = TaskRef::Subtask(parent, n);
                    sink.record(RepairAction::RewroteSiblingRef {
                        node: TaskRef::Subtask(parent, own),
                        old: *r,
                        new,
                    });
                    *r = new;
                    changed = true;
                }
            }
        }
    }
    changed
}

/// Remove every edge the validator flagged, in classification order.
fn prune_edges(doc: &mut Document, sink: &mut impl RepairSink) -> bool {
    let mut removals: HashMap<TaskRef, HashSet<TaskRef>> = HashMap::new();
    for report in classify(doc) {
        let reason = match report.verdict {
            EdgeVerdict::Valid => continue,
            EdgeVerdict::SelfLoop => RemovalReason::SelfLoop,
            EdgeVerdict::Dangling => RemovalReason::Dangling,
            EdgeVerdict::Cyclic => RemovalReason::Cyclic,
        };
        sink.record(RepairAction::RemovedEdge {
            node: report.source,
            removed: report.dep,
            reason,
        });
        removals.entry(report.source).or_default().insert(report.dep);
    }
    if removals.is_empty() {
        return false;
    }
    doc.for_each_deps_mut(|node, deps| {
        if let Some(bad) = removals.get(&node) {
            deps.retain(|r| !bad.contains(r));
        }
    });
    true
}
