//! Derived view and heading focus coordination.
//!
//! The view is recomputed from the current snapshot and filter after every
//! operation. The coordinator also remembers the unfiltered task count of the
//! previous render; when the count drops it asks the UI to move focus to the
//! list heading, which would otherwise be lost with the deleted row.

use serde::Serialize;
use tracing::{debug, trace};

use crate::filter::FilterName;
use crate::store::TaskCollection;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedView {
    pub tasks: Vec<Task>,
    pub count: usize,
    pub heading: String,
}

/// `"<n> task remaining"` for zero and one, `"<n> tasks remaining"` above.
pub fn heading_text(count: usize) -> String {
    let noun = if count <= 1 { "task" } else { "tasks" };
    format!("{count} {noun} remaining")
}

#[tracing::instrument(skip(collection), fields(total = collection.len()))]
pub fn derive_view(collection: &TaskCollection, filter: FilterName) -> DerivedView {
    let keep = filter.predicate();
    let tasks: Vec<Task> = collection.iter().filter(|task| keep(task)).cloned().collect();
    let count = tasks.len();
    trace!(count, "derived view");
    DerivedView {
        tasks,
        count,
        heading: heading_text(count),
    }
}

/// Whether a render that moved from `previous` to `current` tasks must move
/// focus to the heading.
pub fn should_restore_focus(previous: usize, current: usize) -> bool {
    current < previous
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusState {
    Idle,
    FocusPending,
}

/// One-shot request to move focus to the list heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FocusRequest;

/// Receiver of the focus side effect, implemented by the UI layer.
pub trait HeadingFocus {
    fn focus_heading(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Render {
    pub view: DerivedView,
    pub focus: Option<FocusRequest>,
}

#[derive(Debug, Clone)]
pub struct ViewCoordinator {
    state: FocusState,
    previous_len: usize,
}

impl ViewCoordinator {
    pub fn new(initial: &TaskCollection) -> Self {
        Self::with_previous_len(initial.len())
    }

    pub fn with_previous_len(previous_len: usize) -> Self {
        Self {
            state: FocusState::Idle,
            previous_len,
        }
    }

    pub fn state(&self) -> FocusState {
        self.state
    }

    pub fn previous_len(&self) -> usize {
        self.previous_len
    }

    /// Feeds the unfiltered length of a fresh render through the focus state
    /// machine. Fires `on_focus` at most once and always leaves the machine
    /// idle with `previous_len` set to `len`.
    pub fn observe_len<F>(&mut self, len: usize, on_focus: F) -> bool
    where
        F: FnOnce(),
    {
        let fire = should_restore_focus(self.previous_len, len);
        if fire {
            self.state = FocusState::FocusPending;
            debug!(
                previous = self.previous_len,
                current = len,
                "task count dropped; focusing heading"
            );
            on_focus();
            self.state = FocusState::Idle;
        }
        self.previous_len = len;
        fire
    }

    /// Derives the view, then runs the focus rule against the unfiltered
    /// collection length. The view is complete before focus is requested.
    pub fn render(&mut self, collection: &TaskCollection, filter: FilterName) -> Render {
        let view = derive_view(collection, filter);
        let mut focus = None;
        self.observe_len(collection.len(), || focus = Some(FocusRequest));
        Render { view, focus }
    }

    pub fn render_into<H>(
        &mut self,
        collection: &TaskCollection,
        filter: FilterName,
        target: &mut H,
    ) -> DerivedView
    where
        H: HeadingFocus + ?Sized,
    {
        let view = derive_view(collection, filter);
        self.observe_len(collection.len(), || target.focus_heading());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::{
        FocusState, HeadingFocus, ViewCoordinator, derive_view, heading_text, should_restore_focus,
    };
    use crate::filter::FilterName;
    use crate::store::TaskCollection;
    use crate::task::{Task, TaskId};

    #[derive(Default)]
    struct CountingHeading {
        focused: usize,
    }

    impl HeadingFocus for CountingHeading {
        fn focus_heading(&mut self) {
            self.focused += 1;
        }
    }

    fn collection(len: usize) -> TaskCollection {
        (0..len)
            .map(|n| Task::new_active(TaskId::new(format!("todo-{n}")), format!("task {n}")))
            .collect()
    }

    #[test]
    fn heading_pluralization_threshold() {
        assert_eq!(heading_text(0), "0 task remaining");
        assert_eq!(heading_text(1), "1 task remaining");
        assert_eq!(heading_text(2), "2 tasks remaining");
        assert_eq!(heading_text(11), "11 tasks remaining");
    }

    #[test]
    fn view_keeps_original_order_and_counts_filtered_tasks() {
        let mut tasks = collection(4).as_slice().to_vec();
        tasks[1].completed = true;
        tasks[3].completed = true;
        let all = TaskCollection::new(tasks);

        let view = derive_view(&all, FilterName::Completed);
        let ids: Vec<&str> = view.tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["todo-1", "todo-3"]);
        assert_eq!(view.count, 2);
        assert_eq!(view.heading, "2 tasks remaining");

        let active = derive_view(&all, FilterName::Active);
        assert_eq!(active.heading, "2 tasks remaining");
        assert_eq!(derive_view(&TaskCollection::default(), FilterName::All).heading, "0 task remaining");
    }

    #[test]
    fn focus_fires_only_on_decrease() {
        assert!(should_restore_focus(3, 2));
        assert!(!should_restore_focus(2, 2));
        assert!(!should_restore_focus(2, 3));
    }

    #[test]
    fn focus_sequence_fires_twice() {
        let mut coordinator = ViewCoordinator::new(&collection(3));
        let mut heading = CountingHeading::default();

        for len in [3, 3, 2, 2, 1] {
            coordinator.render_into(&collection(len), FilterName::All, &mut heading);
            assert_eq!(coordinator.state(), FocusState::Idle);
            assert_eq!(coordinator.previous_len(), len);
        }

        assert_eq!(heading.focused, 2);
    }

    #[test]
    fn growth_updates_memory_without_focus() {
        let mut coordinator = ViewCoordinator::with_previous_len(1);
        assert!(coordinator.render(&collection(3), FilterName::All).focus.is_none());
        assert_eq!(coordinator.previous_len(), 3);

        let render = coordinator.render(&collection(2), FilterName::All);
        assert!(render.focus.is_some());
        assert!(coordinator.render(&collection(2), FilterName::All).focus.is_none());
    }

    #[test]
    fn focus_uses_unfiltered_length() {
        let mut tasks = collection(3).as_slice().to_vec();
        tasks[0].completed = true;
        let before = TaskCollection::new(tasks);
        let mut coordinator = ViewCoordinator::new(&before);

        let after = before.without(&TaskId::from("todo-0"));
        let render = coordinator.render(&after, FilterName::Active);

        assert_eq!(render.view.count, 2);
        assert!(render.focus.is_some(), "deleting a hidden task still moves focus");
    }
}
