use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for TaskId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A single to-do item.
///
/// Values are never mutated after they enter a collection; toggling and
/// renaming go through [`Task::toggled`] and [`Task::renamed`], which hand
/// back a fresh value with the same id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,

    pub name: String,

    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new_active(id: TaskId, name: String) -> Self {
        Self {
            id,
            name,
            completed: false,
        }
    }

    pub fn toggled(&self) -> Self {
        Self {
            completed: !self.completed,
            ..self.clone()
        }
    }

    pub fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    pub fn is_active(&self) -> bool {
        !self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskId};

    #[test]
    fn toggled_and_renamed_keep_identity() {
        let task = Task::new_active(TaskId::from("todo-1"), "Sleep".to_string());

        let done = task.toggled();
        assert_eq!(done.id, task.id);
        assert_eq!(done.name, "Sleep");
        assert!(done.completed);
        assert!(!task.completed, "original value must be untouched");

        let renamed = done.renamed("Nap");
        assert_eq!(renamed.id, task.id);
        assert_eq!(renamed.name, "Nap");
        assert!(renamed.completed);
    }

    #[test]
    fn serializes_with_transparent_id() {
        let task = Task::new_active(TaskId::from("todo-0"), "Eat".to_string());
        let json = serde_json::to_string(&task).unwrap();
        assert_eq!(json, r#"{"id":"todo-0","name":"Eat","completed":false}"#);

        let parsed: Task = serde_json::from_str(r#"{"id":"todo-9","name":"Repeat"}"#).unwrap();
        assert_eq!(parsed.id.as_str(), "todo-9");
        assert!(!parsed.completed);
    }
}
