//! The task document model.
//!
//! A [`Document`] is the single JSON artifact the engine operates on: a list
//! of tasks, each with optional subtasks and dependency edges. The engine
//! never owns a document between calls; callers pass it into every operation
//! and decide themselves when to persist it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::refs::TaskRef;

/// Lifecycle status of a task or subtask.
///
/// The document records facts, not a workflow: any status may move to any
/// other status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Done,
    Review,
    Deferred,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Done => "done",
            TaskStatus::Review => "review",
            TaskStatus::Deferred => "deferred",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(TaskStatus::Pending),
            "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            "review" => Ok(TaskStatus::Review),
            "deferred" => Ok(TaskStatus::Deferred),
            "cancelled" => Ok(TaskStatus::Cancelled),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Task priority. Subtasks do not carry a priority of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// An ordered list of dependency references.
///
/// Deserialization is lenient so that a damaged document can still be loaded
/// and then repaired: entries that do not parse as references are kept
/// verbatim in `invalid`, and a `dependencies` field that is not an array at
/// all is recorded as `malformed` with an empty list. Nothing is silently
/// dropped at load time; the repair pass reports and clears both conditions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DependencyList {
    refs: Vec<TaskRef>,
    invalid: Vec<Value>,
    malformed: bool,
}

impl DependencyList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refs(&self) -> &[TaskRef] {
        &self.refs
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRef> {
        self.refs.iter()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty() && self.invalid.is_empty()
    }

    pub fn contains(&self, r: &TaskRef) -> bool {
        self.refs.contains(r)
    }

    pub fn push(&mut self, r: TaskRef) {
        self.refs.push(r);
    }

    /// Remove every occurrence of `r`. Returns `true` if anything was removed.
    pub fn remove(&mut self, r: &TaskRef) -> bool {
        let before = self.refs.len();
        self.refs.retain(|existing| existing != r);
        self.refs.len() != before
    }

    pub fn retain(&mut self, keep: impl FnMut(&TaskRef) -> bool) {
        self.refs.retain(keep);
    }

    /// Rewrite every occurrence of `old` to `new`. Returns the rewrite count.
    pub fn rewrite(&mut self, old: &TaskRef, new: TaskRef) -> usize {
        let mut count = 0;
        for r in &mut self.refs {
            if r == old {
                *r = new;
                count += 1;
            }
        }
        count
    }

    /// In-place replacement of a single ref; used by the migration pass.
    pub(crate) fn refs_mut(&mut self) -> &mut [TaskRef] {
        &mut self.refs
    }

    /// Whether the source document stored something other than an array here.
    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    pub(crate) fn clear_malformed(&mut self) {
        self.malformed = false;
    }

    /// Entries from the source document that did not parse as references.
    pub fn invalid_entries(&self) -> &[Value] {
        &self.invalid
    }

    pub(crate) fn take_invalid(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.invalid)
    }

    fn from_value(value: Value) -> Self {
        let entries = match value {
            Value::Array(entries) => entries,
            _ => {
                return DependencyList {
                    refs: Vec::new(),
                    invalid: Vec::new(),
                    malformed: true,
                }
            }
        };
        let mut list = DependencyList::new();
        for entry in entries {
            let parsed = match &entry {
                Value::Number(n) => n.as_u64().filter(|v| *v > 0).map(TaskRef::Task),
                Value::String(s) => s.parse().ok(),
                _ => None,
            };
            match parsed {
                Some(r) => list.refs.push(r),
                None => list.invalid.push(entry),
            }
        }
        list
    }
}

impl From<Vec<TaskRef>> for DependencyList {
    fn from(refs: Vec<TaskRef>) -> Self {
        DependencyList {
            refs,
            invalid: Vec::new(),
            malformed: false,
        }
    }
}

impl Serialize for DependencyList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.refs.len() + self.invalid.len()))?;
        for r in &self.refs {
            seq.serialize_element(r)?;
        }
        for entry in &self.invalid {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for DependencyList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(DependencyList::from_value(Value::deserialize(deserializer)?))
    }
}

/// A subtask. Its id is unique only within its parent task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub dependencies: DependencyList,
}

impl Subtask {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Subtask {
            id,
            title: title.into(),
            ..Subtask::default()
        }
    }
}

/// A top-level task.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
    #[serde(default, rename = "testStrategy")]
    pub test_strategy: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub dependencies: DependencyList,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Task {
            id,
            title: title.into(),
            ..Task::default()
        }
    }

    pub fn subtask(&self, id: u64) -> Option<&Subtask> {
        self.subtasks.iter().find(|s| s.id == id)
    }

    pub fn subtask_mut(&mut self, id: u64) -> Option<&mut Subtask> {
        self.subtasks.iter_mut().find(|s| s.id == id)
    }

    /// Next unused subtask id under this task.
    pub fn next_subtask_id(&self) -> u64 {
        self.subtasks.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }
}

/// The whole work-breakdown document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Document {
    pub fn new(tasks: Vec<Task>) -> Self {
        Document { tasks }
    }

    pub fn task(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn subtask(&self, parent: u64, sub: u64) -> Option<&Subtask> {
        self.task(parent).and_then(|t| t.subtask(sub))
    }

    pub fn subtask_mut(&mut self, parent: u64, sub: u64) -> Option<&mut Subtask> {
        self.task_mut(parent).and_then(|t| t.subtask_mut(sub))
    }

    /// Whether `r` addresses an existing node.
    pub fn contains(&self, r: &TaskRef) -> bool {
        match *r {
            TaskRef::Task(id) => self.task(id).is_some(),
            TaskRef::Subtask(parent, sub) => self.subtask(parent, sub).is_some(),
        }
    }

    /// Dependency list of the addressed node, if it exists.
    pub fn deps_of(&self, r: &TaskRef) -> Option<&DependencyList> {
        match *r {
            TaskRef::Task(id) => self.task(id).map(|t| &t.dependencies),
            TaskRef::Subtask(parent, sub) => self.subtask(parent, sub).map(|s| &s.dependencies),
        }
    }

    /// Mutable dependency list of the addressed node, if it exists.
    pub fn deps_of_mut(&mut self, r: &TaskRef) -> Option<&mut DependencyList> {
        match *r {
            TaskRef::Task(id) => self.task_mut(id).map(|t| &mut t.dependencies),
            TaskRef::Subtask(parent, sub) => {
                self.subtask_mut(parent, sub).map(|s| &mut s.dependencies)
            }
        }
    }

    /// Every node address with its dependency list, in document order: each
    /// task followed by its subtasks. Classification and repair rely on this
    /// order being stable.
    pub fn nodes(&self) -> Vec<(TaskRef, &DependencyList)> {
        let mut out = Vec::new();
        for task in &self.tasks {
            out.push((TaskRef::Task(task.id), &task.dependencies));
            for sub in &task.subtasks {
                out.push((TaskRef::Subtask(task.id, sub.id), &sub.dependencies));
            }
        }
        out
    }

    /// Visit every dependency list mutably, in document order.
    pub fn for_each_deps_mut(&mut self, mut visit: impl FnMut(TaskRef, &mut DependencyList)) {
        for task in &mut self.tasks {
            visit(TaskRef::Task(task.id), &mut task.dependencies);
            let parent = task.id;
            for sub in &mut task.subtasks {
                visit(TaskRef::Subtask(parent, sub.id), &mut sub.dependencies);
            }
        }
    }

    /// Rewrite every reference to `old` across the document. Returns the
    /// number of rewritten refs.
    pub fn rewrite_refs(&mut self, old: &TaskRef, new: TaskRef) -> usize {
        let mut count = 0;
        self.for_each_deps_mut(|_, deps| count += deps.rewrite(old, new));
        count
    }

    /// Next unused task id (`max + 1`, or 1 for an empty document).
    pub fn next_task_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    pub(crate) fn remove_task(&mut self, id: u64) -> Option<Task> {
        let pos = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_the_documented_shape() {
        let doc: Document = serde_json::from_value(serde_json::json!({
            "tasks": [
                {
                    "id": 1,
                    "title": "Set up project",
                    "description": "Scaffold the repo",
                    "details": "",
                    "testStrategy": "cargo test",
                    "status": "in-progress",
                    "priority": "high",
                    "dependencies": [],
                    "subtasks": [
                        {
                            "id": 1,
                            "title": "Init git",
                            "description": "",
                            "status": "done",
                            "dependencies": [1, "2.1"]
                        }
                    ]
                },
                { "id": 2, "title": "Second", "subtasks": [{ "id": 1, "title": "s" }] }
            ]
        }))
        .unwrap();

        let task = doc.task(1).unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.test_strategy, "cargo test");
        let sub = doc.subtask(1, 1).unwrap();
        assert_eq!(
            sub.dependencies.refs(),
            &[TaskRef::Task(1), TaskRef::Subtask(2, 1)]
        );
        // Defaults for the terse second task.
        let second = doc.task(2).unwrap();
        assert_eq!(second.status, TaskStatus::Pending);
        assert_eq!(second.priority, Priority::Medium);
    }

    #[test]
    fn lenient_dependency_parsing_keeps_invalid_entries() {
        let list: DependencyList = serde_json::from_value(serde_json::json!([
            3,
            "4.1",
            "not-a-ref",
            0,
            true
        ]))
        .unwrap();
        assert_eq!(list.refs(), &[TaskRef::Task(3), TaskRef::Subtask(4, 1)]);
        assert_eq!(list.invalid_entries().len(), 3);
        assert!(!list.is_malformed());

        // Invalid entries survive a save so nothing is dropped outside repair.
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json, serde_json::json!([3, "4.1", "not-a-ref", 0, true]));
    }

    #[test]
    fn non_list_dependencies_are_marked_malformed() {
        let list: DependencyList = serde_json::from_value(serde_json::json!("3")).unwrap();
        assert!(list.is_malformed());
        assert!(list.refs().is_empty());
    }

    #[test]
    fn status_round_trips_kebab_case() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in-progress\""
        );
        assert_eq!("in-progress".parse::<TaskStatus>(), Ok(TaskStatus::InProgress));
        assert!("doing".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn id_allocation_is_max_plus_one() {
        let mut doc = Document::new(vec![Task::new(3, "a"), Task::new(7, "b")]);
        assert_eq!(doc.next_task_id(), 8);
        doc.task_mut(3).unwrap().subtasks.push(Subtask::new(2, "s"));
        assert_eq!(doc.task(3).unwrap().next_subtask_id(), 3);
        assert_eq!(Document::default().next_task_id(), 1);
    }

    #[test]
    fn rewrite_refs_touches_every_list() {
        let mut doc = Document::new(vec![Task::new(1, "a"), Task::new(2, "b")]);
        doc.task_mut(1).unwrap().dependencies = vec![TaskRef::Subtask(2, 1)].into();
        doc.task_mut(2).unwrap().subtasks.push(Subtask::new(1, "s"));
        doc.task_mut(2).unwrap().subtasks.push(Subtask::new(2, "t"));
        doc.subtask_mut(2, 2).unwrap().dependencies = vec![TaskRef::Subtask(2, 1)].into();

        let rewritten = doc.rewrite_refs(&TaskRef::Subtask(2, 1), TaskRef::Task(9));
        assert_eq!(rewritten, 2);
        assert_eq!(doc.task(1).unwrap().dependencies.refs(), &[TaskRef::Task(9)]);
    }
}
