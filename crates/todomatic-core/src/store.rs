use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ids::IdGenerator;
use crate::task::{Task, TaskId};

/// Immutable, insertion-ordered snapshot of tasks.
///
/// Every transformation returns a new snapshot and leaves `self` intact, so a
/// previous snapshot stays valid for comparison after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskCollection {
    tasks: Vec<Task>,
}

impl TaskCollection {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Task> {
        self.tasks.iter()
    }

    pub fn as_slice(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| &task.id == id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    pub fn with_task(&self, task: Task) -> Self {
        let mut tasks = Vec::with_capacity(self.tasks.len() + 1);
        tasks.extend(self.tasks.iter().cloned());
        tasks.push(task);
        Self { tasks }
    }

    pub fn toggled(&self, id: &TaskId) -> Self {
        self.replace_matching(id, Task::toggled)
    }

    pub fn renamed(&self, id: &TaskId, name: &str) -> Self {
        self.replace_matching(id, |task| task.renamed(name))
    }

    pub fn without(&self, id: &TaskId) -> Self {
        Self {
            tasks: self
                .tasks
                .iter()
                .filter(|task| &task.id != id)
                .cloned()
                .collect(),
        }
    }

    fn replace_matching<F>(&self, id: &TaskId, update: F) -> Self
    where
        F: Fn(&Task) -> Task,
    {
        Self {
            tasks: self
                .tasks
                .iter()
                .map(|task| {
                    if &task.id == id {
                        update(task)
                    } else {
                        task.clone()
                    }
                })
                .collect(),
        }
    }
}

impl From<Vec<Task>> for TaskCollection {
    fn from(tasks: Vec<Task>) -> Self {
        Self::new(tasks)
    }
}

impl FromIterator<Task> for TaskCollection {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a TaskCollection {
    type Item = &'a Task;
    type IntoIter = std::slice::Iter<'a, Task>;

    fn into_iter(self) -> Self::IntoIter {
        self.tasks.iter()
    }
}

/// Owner of the current [`TaskCollection`].
///
/// Mutations on an id that is not in the collection are no-ops: the id space
/// is ours, so an unknown id only means the task was already deleted.
pub struct TaskStore {
    current: TaskCollection,
    ids: Box<dyn IdGenerator>,
}

impl fmt::Debug for TaskStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("current", &self.current)
            .finish_non_exhaustive()
    }
}

impl TaskStore {
    pub fn new(initial: TaskCollection, ids: Box<dyn IdGenerator>) -> Self {
        info!(count = initial.len(), "initialized task store");
        Self {
            current: initial,
            ids,
        }
    }

    pub fn tasks(&self) -> &TaskCollection {
        &self.current
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.current.get(id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.current.contains(id)
    }

    #[tracing::instrument(skip(self, name))]
    pub fn add(&mut self, name: &str) -> &TaskCollection {
        let task = Task::new_active(self.ids.next_id(), name.to_string());
        debug!(id = %task.id, "adding task");
        let next = self.current.with_task(task);
        self.replace(next)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn toggle(&mut self, id: &TaskId) -> &TaskCollection {
        if !self.current.contains(id) {
            debug!("toggle on unknown task id; no-op");
            return &self.current;
        }
        let next = self.current.toggled(id);
        self.replace(next)
    }

    #[tracing::instrument(skip(self, name), fields(id = %id))]
    pub fn edit(&mut self, id: &TaskId, name: &str) -> &TaskCollection {
        if !self.current.contains(id) {
            debug!("edit on unknown task id; no-op");
            return &self.current;
        }
        let next = self.current.renamed(id, name);
        self.replace(next)
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    pub fn delete(&mut self, id: &TaskId) -> &TaskCollection {
        if !self.current.contains(id) {
            debug!("delete on unknown task id; no-op");
            return &self.current;
        }
        let before = self.current.len();
        let next = self.current.without(id);
        info!(before, after = next.len(), "deleted task");
        self.replace(next)
    }

    fn replace(&mut self, next: TaskCollection) -> &TaskCollection {
        self.current = next;
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::{TaskCollection, TaskStore};
    use crate::ids::SequentialIdGenerator;
    use crate::task::{Task, TaskId};

    fn sample() -> TaskCollection {
        let mut done = Task::new_active(TaskId::from("todo-0"), "Eat".to_string());
        done.completed = true;
        TaskCollection::new(vec![
            done,
            Task::new_active(TaskId::from("todo-1"), "Sleep".to_string()),
            Task::new_active(TaskId::from("todo-2"), "Repeat".to_string()),
        ])
    }

    fn store_with(initial: TaskCollection) -> TaskStore {
        TaskStore::new(initial, Box::new(SequentialIdGenerator::new("task-", 0)))
    }

    fn ids(collection: &TaskCollection) -> Vec<&str> {
        collection.iter().map(|task| task.id.as_str()).collect()
    }

    #[test]
    fn add_appends_active_task_with_fresh_id() {
        let mut store = store_with(sample());
        let after = store.add("Write report").clone();

        assert_eq!(after.len(), 4);
        let added = after.as_slice().last().unwrap();
        assert_eq!(added.name, "Write report");
        assert!(!added.completed);
        assert_eq!(ids(&after), vec!["todo-0", "todo-1", "todo-2", "task-0"]);
    }

    #[test]
    fn add_accepts_blank_names() {
        let mut store = store_with(TaskCollection::default());
        store.add("");
        store.add("   ");
        assert_eq!(store.tasks().len(), 2);
        assert_eq!(store.tasks().as_slice()[1].name, "   ");
    }

    #[test]
    fn added_ids_are_pairwise_distinct() {
        let mut store = store_with(TaskCollection::default());
        for n in 0..50 {
            store.add(&format!("task {n}"));
        }
        let unique: HashSet<&TaskId> = store.tasks().iter().map(|task| &task.id).collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn toggle_twice_restores_the_collection() {
        let original = sample();
        let mut store = store_with(original.clone());
        let id = TaskId::from("todo-1");

        let once = store.toggle(&id).clone();
        assert!(once.get(&id).unwrap().completed);
        assert_eq!(ids(&once), ids(&original));

        let twice = store.toggle(&id).clone();
        assert_eq!(twice, original);
    }

    #[test]
    fn edit_changes_only_the_name() {
        let mut store = store_with(sample());
        let id = TaskId::from("todo-0");
        let after = store.edit(&id, "Eat breakfast").clone();

        let edited = after.get(&id).unwrap();
        assert_eq!(edited.name, "Eat breakfast");
        assert!(edited.completed);
        assert_eq!(ids(&after), vec!["todo-0", "todo-1", "todo-2"]);
        assert_eq!(after.as_slice()[1..], sample().as_slice()[1..]);
    }

    #[test]
    fn delete_shrinks_by_exactly_one() {
        let original = sample();
        let mut store = store_with(original.clone());
        let after = store.delete(&TaskId::from("todo-1")).clone();

        assert_eq!(after.len(), original.len() - 1);
        assert_eq!(ids(&after), vec!["todo-0", "todo-2"]);
        assert_eq!(after.as_slice()[0], original.as_slice()[0]);
        assert_eq!(after.as_slice()[1], original.as_slice()[2]);
    }

    #[test]
    fn unknown_id_is_a_no_op_for_every_mutation() {
        let original = sample();
        let mut store = store_with(original.clone());
        let missing = TaskId::from("todo-404");

        assert_eq!(store.toggle(&missing), &original);
        assert_eq!(store.edit(&missing, "renamed"), &original);
        assert_eq!(store.delete(&missing), &original);
    }

    #[test]
    fn snapshots_are_not_mutated_by_later_operations() {
        let mut store = store_with(sample());
        let before = store.tasks().clone();
        store.toggle(&TaskId::from("todo-2"));
        store.delete(&TaskId::from("todo-0"));

        assert_eq!(before, sample());
        assert_eq!(store.tasks().len(), 2);
    }
}
