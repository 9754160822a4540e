use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::{
    storage::{
        entities::Task,
        local_store::{read_json, write_json, LocalStore},
        TASKS_KEY,
    },
    sync::{queue::SyncHandle, RemotePaths},
    utils::clock::Clock,
};

/// Owns the task list. The list is stored whole under a single key and mirrored whole as well.
pub struct TaskRegistry {
    store: Arc<dyn LocalStore>,
    sync: SyncHandle,
    paths: RemotePaths,
    clock: Arc<dyn Clock>,
}

impl TaskRegistry {
    pub fn new(
        store: Arc<dyn LocalStore>,
        sync: SyncHandle,
        paths: RemotePaths,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sync,
            paths,
            clock,
        }
    }

    /// Tasks in insertion order. A missing or malformed list is empty.
    pub fn list(&self) -> Result<Vec<Task>> {
        Ok(read_json(self.store.as_ref(), TASKS_KEY)?.unwrap_or_default())
    }

    /// Adds a task named `name` (trimmed). Blank names are ignored and return `None`.
    pub fn add(&self, name: &str) -> Result<Option<Task>> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let mut tasks = self.list()?;
        let task = Task {
            id: self.next_id(&tasks),
            name: name.to_owned(),
        };
        tasks.push(task.clone());
        self.save(&tasks)?;
        info!("Added task {} ({})", task.id, task.name);
        Ok(Some(task))
    }

    /// Removes the task with `id`. Removing an unknown id changes nothing.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut tasks = self.list()?;
        tasks.retain(|task| task.id != id);
        self.save(&tasks)?;
        info!("Removed task {id}");
        Ok(())
    }

    /// Ids are the creation time in milliseconds. When that id is taken (two adds within the same
    /// millisecond) the id continues from the largest numeric id instead.
    fn next_id(&self, tasks: &[Task]) -> String {
        let now = self.clock.timestamp_millis();
        let candidate = now.to_string();
        if tasks.iter().all(|task| task.id != candidate) {
            return candidate;
        }
        let largest = tasks
            .iter()
            .filter_map(|task| task.id.parse::<i64>().ok())
            .max()
            .unwrap_or(now);
        (largest.max(now) + 1).to_string()
    }

    fn save(&self, tasks: &[Task]) -> Result<()> {
        write_json(self.store.as_ref(), TASKS_KEY, tasks)?;
        self.sync.push(self.paths.tasks(), serde_json::to_value(tasks)?);
        Ok(())
    }
}
