use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tracing::{debug, info};

use crate::store::TaskCollection;
use crate::task::{Task, TaskId};

#[derive(Debug, Deserialize)]
struct TomlSeed {
    #[serde(default)]
    tasks: Vec<Task>,
}

/// The tasks a fresh session starts with when no seed file is configured.
pub fn default_tasks() -> TaskCollection {
    TaskCollection::new(vec![
        Task {
            id: TaskId::from("todo-0"),
            name: "Eat".to_string(),
            completed: true,
        },
        Task {
            id: TaskId::from("todo-1"),
            name: "Sleep".to_string(),
            completed: false,
        },
        Task {
            id: TaskId::from("todo-2"),
            name: "Repeat".to_string(),
            completed: false,
        },
    ])
}

/// Loads an initial task list. `.toml` files hold `[[tasks]]` tables, every
/// other extension is read as a JSON array.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load(path: &Path) -> anyhow::Result<TaskCollection> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    debug!(is_toml, bytes = raw.len(), "parsing seed file");

    let tasks = if is_toml {
        toml::from_str::<TomlSeed>(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?
            .tasks
    } else {
        serde_json::from_str::<Vec<Task>>(&raw)
            .with_context(|| format!("failed parsing {}", path.display()))?
    };

    ensure_unique_ids(&tasks).with_context(|| format!("invalid seed file {}", path.display()))?;
    info!(count = tasks.len(), "loaded seed tasks");
    Ok(TaskCollection::new(tasks))
}

pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<TaskCollection> {
    match path {
        Some(path) => load(path),
        None => {
            debug!("no seed file configured; using built-in tasks");
            Ok(default_tasks())
        }
    }
}

fn ensure_unique_ids(tasks: &[Task]) -> anyhow::Result<()> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(&task.id) {
            return Err(anyhow!("duplicate task id: {}", task.id));
        }
    }
    Ok(())
}
