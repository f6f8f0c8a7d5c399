//! Typed task and subtask references.
//!
//! Every dependency edge and every operation address in the document is a
//! [`TaskRef`], parsed once at the boundary. The textual forms are `"12"`
//! (task 12) and `"12.3"` (subtask 3 of task 12); on the wire a task
//! reference serializes as a bare JSON number and a subtask reference as a
//! dotted string, matching the document format.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical address of a node in the dependency graph.
///
/// A bare integer always addresses a task, including inside a subtask's own
/// dependency list; legacy documents that relied on bare integers meaning
/// "sibling subtask" are rewritten by the repair pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskRef {
    /// A top-level task, addressed by its document-unique id.
    Task(u64),
    /// A subtask, addressed as `(parent task id, subtask id)`.
    Subtask(u64, u64),
}

impl TaskRef {
    /// The parent task id this reference lives under, if it is a subtask ref.
    pub fn parent(&self) -> Option<u64> {
        match *self {
            TaskRef::Task(_) => None,
            TaskRef::Subtask(parent, _) => Some(parent),
        }
    }

    pub fn is_task(&self) -> bool {
        matches!(self, TaskRef::Task(_))
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TaskRef::Task(id) => write!(f, "{}", id),
            TaskRef::Subtask(parent, sub) => write!(f, "{}.{}", parent, sub),
        }
    }
}

/// Errors from parsing a textual reference.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefParseError {
    #[error("empty reference")]
    Empty,

    #[error("reference '{0}' has more than one '.' separator")]
    TooManySegments(String),

    #[error("reference segment '{0}' is not a number")]
    NonNumeric(String),

    #[error("reference segment '{0}' must be a positive id")]
    ZeroId(String),
}

fn parse_segment(segment: &str) -> Result<u64, RefParseError> {
    let id: u64 = segment
        .parse()
        .map_err(|_| RefParseError::NonNumeric(segment.to_string()))?;
    if id == 0 {
        return Err(RefParseError::ZeroId(segment.to_string()));
    }
    Ok(id)
}

impl FromStr for TaskRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(RefParseError::Empty);
        }
        let mut segments = trimmed.split('.');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(task), None, _) => Ok(TaskRef::Task(parse_segment(task)?)),
            (Some(parent), Some(sub), None) => Ok(TaskRef::Subtask(
                parse_segment(parent)?,
                parse_segment(sub)?,
            )),
            _ => Err(RefParseError::TooManySegments(trimmed.to_string())),
        }
    }
}

impl Serialize for TaskRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match *self {
            TaskRef::Task(id) => serializer.serialize_u64(id),
            TaskRef::Subtask(..) => serializer.collect_str(self),
        }
    }
}

struct TaskRefVisitor;

impl Visitor<'_> for TaskRefVisitor {
    type Value = TaskRef;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a task id or a \"parent.sub\" string")
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<TaskRef, E> {
        if value == 0 {
            return Err(E::custom("task ids must be positive"));
        }
        Ok(TaskRef::Task(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<TaskRef, E> {
        u64::try_from(value)
            .ok()
            .filter(|v| *v > 0)
            .map(TaskRef::Task)
            .ok_or_else(|| E::custom("task ids must be positive"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<TaskRef, E> {
        value.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for TaskRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(TaskRefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_task_and_subtask_forms() {
        assert_eq!("12".parse::<TaskRef>().unwrap(), TaskRef::Task(12));
        assert_eq!("12.3".parse::<TaskRef>().unwrap(), TaskRef::Subtask(12, 3));
        assert_eq!(" 7 ".parse::<TaskRef>().unwrap(), TaskRef::Task(7));
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!("".parse::<TaskRef>(), Err(RefParseError::Empty));
        assert_eq!("  ".parse::<TaskRef>(), Err(RefParseError::Empty));
        assert!(matches!(
            "1.2.3".parse::<TaskRef>(),
            Err(RefParseError::TooManySegments(_))
        ));
        assert!(matches!(
            "abc".parse::<TaskRef>(),
            Err(RefParseError::NonNumeric(_))
        ));
        assert!(matches!(
            "1.x".parse::<TaskRef>(),
            Err(RefParseError::NonNumeric(_))
        ));
        assert!(matches!(
            "0".parse::<TaskRef>(),
            Err(RefParseError::ZeroId(_))
        ));
        assert!(matches!(
            "5.0".parse::<TaskRef>(),
            Err(RefParseError::ZeroId(_))
        ));
    }

    #[test]
    fn display_round_trips_through_parse() {
        for r in [TaskRef::Task(4), TaskRef::Subtask(4, 9)] {
            assert_eq!(r.to_string().parse::<TaskRef>().unwrap(), r);
        }
    }

    #[test]
    fn serializes_tasks_as_numbers_and_subtasks_as_strings() {
        assert_eq!(serde_json::to_string(&TaskRef::Task(5)).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&TaskRef::Subtask(5, 2)).unwrap(),
            "\"5.2\""
        );
    }

    #[test]
    fn deserializes_numbers_and_strings() {
        assert_eq!(
            serde_json::from_str::<TaskRef>("5").unwrap(),
            TaskRef::Task(5)
        );
        assert_eq!(
            serde_json::from_str::<TaskRef>("\"5\"").unwrap(),
            TaskRef::Task(5)
        );
        assert_eq!(
            serde_json::from_str::<TaskRef>("\"5.2\"").unwrap(),
            TaskRef::Subtask(5, 2)
        );
        assert!(serde_json::from_str::<TaskRef>("0").is_err());
        assert!(serde_json::from_str::<TaskRef>("true").is_err());
    }
}
