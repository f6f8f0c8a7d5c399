//! Dependency-graph validation.
//!
//! [`classify`] walks every dependency edge in document order and assigns a
//! verdict without mutating anything. "Dangling edge" and friends are
//! expected, repairable data conditions here, not errors; the repair pass
//! decides what to do about them.

use crate::document::Document;
use crate::refs::TaskRef;

/// Verdict for a single dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeVerdict {
    /// Resolves to an existing node and is not part of a cycle.
    Valid,
    /// The node references itself.
    SelfLoop,
    /// The referenced node does not exist.
    Dangling,
    /// Following the referenced node's own edges leads back to the source.
    Cyclic,
}

impl std::fmt::Display for EdgeVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EdgeVerdict::Valid => "valid",
            EdgeVerdict::SelfLoop => "self-loop",
            EdgeVerdict::Dangling => "dangling",
            EdgeVerdict::Cyclic => "cyclic",
        })
    }
}

/// One classified edge: `source` depends on `dep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeReport {
    pub source: TaskRef,
    pub dep: TaskRef,
    pub verdict: EdgeVerdict,
}

/// Classify every edge in the document.
///
/// Order is stable: tasks in list order, each task's own edges before its
/// subtasks' edges, each dependency list front to back. Repeated runs over
/// the same document therefore produce the same removal set, which is what
/// makes incremental repair deterministic.
pub fn classify(doc: &Document) -> Vec<EdgeReport> {
    let mut reports = Vec::new();
    for (source, deps) in doc.nodes() {
        for dep in deps.iter() {
            let verdict = if *dep == source {
                EdgeVerdict::SelfLoop
            } else if !doc.contains(dep) {
                EdgeVerdict::Dangling
            } else if reaches(doc, *dep, source, &mut Vec::new()) {
                EdgeVerdict::Cyclic
            } else {
                EdgeVerdict::Valid
            };
            reports.push(EdgeReport {
                source,
                dep: *dep,
                verdict,
            });
        }
    }
    reports
}

/// Would adding the edge `from -> to` close a cycle?
///
/// True iff `to` already reaches `from` through existing edges. Used by the
/// add-dependency mutator to reject the edge up front instead of creating it
/// and immediately repairing it away.
pub fn creates_cycle(doc: &Document, from: TaskRef, to: TaskRef) -> bool {
    reaches(doc, to, from, &mut Vec::new())
}

/// Depth-first reachability from `from` to `target`.
///
/// The chain holds the current call path only (popped on exit), not a global
/// visited set: each edge is judged on its own walk so the answer for one
/// edge never depends on which edges were inspected before it. Unresolvable
/// refs simply have no outgoing edges.
fn reaches(doc: &Document, from: TaskRef, target: TaskRef, chain: &mut Vec<TaskRef>) -> bool {
    if from == target {
        return true;
    }
    if chain.contains(&from) {
        return false;
    }
    chain.push(from);
    let found = doc
        .deps_of(&from)
        .is_some_and(|deps| deps.iter().any(|dep| reaches(doc, *dep, target, chain)));
    chain.pop();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Subtask, Task};

    fn doc_with_deps(edges: &[(u64, &[TaskRef])]) -> Document {
        Document::new(
            edges
                .iter()
                .map(|(id, deps)| {
                    let mut t = Task::new(*id, format!("task {}", id));
                    t.dependencies = deps.to_vec().into();
                    t
                })
                .collect(),
        )
    }

    fn verdicts(doc: &Document) -> Vec<(TaskRef, TaskRef, EdgeVerdict)> {
        classify(doc)
            .into_iter()
            .map(|r| (r.source, r.dep, r.verdict))
            .collect()
    }

    #[test]
    fn valid_chain_has_no_findings() {
        let doc = doc_with_deps(&[
            (1, &[TaskRef::Task(2)]),
            (2, &[TaskRef::Task(3)]),
            (3, &[]),
        ]);
        assert!(classify(&doc)
            .iter()
            .all(|r| r.verdict == EdgeVerdict::Valid));
    }

    #[test]
    fn flags_self_loops_and_dangling_edges() {
        let doc = doc_with_deps(&[(1, &[TaskRef::Task(1), TaskRef::Task(9)])]);
        assert_eq!(
            verdicts(&doc),
            vec![
                (TaskRef::Task(1), TaskRef::Task(1), EdgeVerdict::SelfLoop),
                (TaskRef::Task(1), TaskRef::Task(9), EdgeVerdict::Dangling),
            ]
        );
    }

    #[test]
    fn flags_every_edge_of_a_cycle() {
        let doc = doc_with_deps(&[
            (1, &[TaskRef::Task(2)]),
            (2, &[TaskRef::Task(3)]),
            (3, &[TaskRef::Task(1)]),
        ]);
        assert!(classify(&doc)
            .iter()
            .all(|r| r.verdict == EdgeVerdict::Cyclic));
    }

    #[test]
    fn edge_into_a_cycle_is_not_itself_cyclic() {
        // 1 -> 2 <-> 3: task 1 merely points into the cycle.
        let doc = doc_with_deps(&[
            (1, &[TaskRef::Task(2)]),
            (2, &[TaskRef::Task(3)]),
            (3, &[TaskRef::Task(2)]),
        ]);
        let v = verdicts(&doc);
        assert_eq!(v[0].2, EdgeVerdict::Valid);
        assert_eq!(v[1].2, EdgeVerdict::Cyclic);
        assert_eq!(v[2].2, EdgeVerdict::Cyclic);
    }

    #[test]
    fn subtask_edges_are_classified_in_document_order() {
        let mut doc = doc_with_deps(&[(1, &[]), (2, &[TaskRef::Subtask(1, 1)])]);
        let mut sub = Subtask::new(1, "sub");
        sub.dependencies = vec![TaskRef::Task(2), TaskRef::Subtask(1, 1)].into();
        doc.task_mut(1).unwrap().subtasks.push(sub);

        let v = verdicts(&doc);
        // Task 1's subtask comes before task 2 in document order.
        assert_eq!(
            v,
            vec![
                (
                    TaskRef::Subtask(1, 1),
                    TaskRef::Task(2),
                    EdgeVerdict::Cyclic
                ),
                (
                    TaskRef::Subtask(1, 1),
                    TaskRef::Subtask(1, 1),
                    EdgeVerdict::SelfLoop
                ),
                (
                    TaskRef::Task(2),
                    TaskRef::Subtask(1, 1),
                    EdgeVerdict::Cyclic
                ),
            ]
        );
    }

    #[test]
    fn creates_cycle_checks_reverse_reachability() {
        let doc = doc_with_deps(&[
            (1, &[TaskRef::Task(2)]),
            (2, &[TaskRef::Task(3)]),
            (3, &[]),
        ]);
        assert!(creates_cycle(&doc, TaskRef::Task(3), TaskRef::Task(1)));
        assert!(!creates_cycle(&doc, TaskRef::Task(1), TaskRef::Task(3)));
    }

    #[test]
    fn duplicate_edges_do_not_confuse_the_walk() {
        let doc = doc_with_deps(&[
            (1, &[TaskRef::Task(2), TaskRef::Task(2)]),
            (2, &[]),
        ]);
        let v = verdicts(&doc);
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|(_, _, verdict)| *verdict == EdgeVerdict::Valid));
    }
}
