use tracing::{debug, info, instrument};

use crate::filter::{FilterEngine, FilterName, FilterOption};
use crate::ids::IdGenerator;
use crate::store::{TaskCollection, TaskStore};
use crate::task::{Task, TaskId};
use crate::view::{DerivedView, ViewCoordinator};

/// Session state: the task store, the active filter and the view
/// coordinator, mutated only through the operations below.
///
/// Every operation re-renders before returning, so the accessors always
/// reflect the latest snapshot.
#[derive(Debug)]
pub struct TodoApp {
    store: TaskStore,
    filter: FilterEngine,
    coordinator: ViewCoordinator,
    view: DerivedView,
    focus_pending: bool,
}

impl TodoApp {
    pub fn new(initial: TaskCollection, ids: Box<dyn IdGenerator>) -> Self {
        Self::with_filter(initial, ids, FilterName::default())
    }

    pub fn with_filter(
        initial: TaskCollection,
        ids: Box<dyn IdGenerator>,
        filter: FilterName,
    ) -> Self {
        let coordinator = ViewCoordinator::new(&initial);
        let view = crate::view::derive_view(&initial, filter);
        info!(tasks = initial.len(), filter = %filter, "starting todo session");
        Self {
            store: TaskStore::new(initial, ids),
            filter: FilterEngine::new(filter),
            coordinator,
            view,
            focus_pending: false,
        }
    }

    #[instrument(skip(self, name))]
    pub fn add_task(&mut self, name: &str) {
        self.store.add(name);
        self.rerender();
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn toggle_task_completed(&mut self, id: &TaskId) {
        self.store.toggle(id);
        self.rerender();
    }

    #[instrument(skip(self), fields(id = %id))]
    pub fn delete_task(&mut self, id: &TaskId) {
        self.store.delete(id);
        self.rerender();
    }

    #[instrument(skip(self, new_name), fields(id = %id))]
    pub fn edit_task(&mut self, id: &TaskId, new_name: &str) {
        self.store.edit(id, new_name);
        self.rerender();
    }

    /// Selects a filter by display name. Names outside All, Active and
    /// Completed are rejected and leave the session untouched.
    #[instrument(skip(self))]
    pub fn set_filter(&mut self, name: &str) -> anyhow::Result<()> {
        let parsed: FilterName = name.parse()?;
        self.select_filter(parsed);
        Ok(())
    }

    pub fn select_filter(&mut self, name: FilterName) {
        self.filter.set_filter(name);
        self.rerender();
    }

    pub fn tasks(&self) -> &TaskCollection {
        self.store.tasks()
    }

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.store.get(id)
    }

    pub fn view(&self) -> &DerivedView {
        &self.view
    }

    pub fn visible_tasks(&self) -> &[Task] {
        &self.view.tasks
    }

    pub fn heading_text(&self) -> &str {
        &self.view.heading
    }

    pub fn active_filter(&self) -> FilterName {
        self.filter.active()
    }

    pub fn filter_options(&self) -> Vec<FilterOption> {
        self.filter.options()
    }

    /// Returns `true` once after a render that shrank the task list.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_pending)
    }

    fn rerender(&mut self) {
        let render = self
            .coordinator
            .render(self.store.tasks(), self.filter.active());
        self.view = render.view;
        if render.focus.is_some() {
            self.focus_pending = true;
        }
        debug!(
            total = self.store.tasks().len(),
            visible = self.view.count,
            focus = self.focus_pending,
            "re-rendered"
        );
    }
}
