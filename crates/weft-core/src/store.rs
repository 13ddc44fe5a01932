use std::collections::HashMap;
use std::sync::Mutex;

use futures::future::BoxFuture;
use tracing::debug;

use crate::error::Result;
use crate::task::Task;

/// Keyed registry of task records, so task status stays queryable after the
/// fact. No eviction, no durability; replaceable by anything keyed on the
/// task id.
pub trait TaskStore: Send + Sync + 'static {
    /// Insert or overwrite the record for `task.id`.
    fn put(&self, task: Task) -> BoxFuture<'_, Result<()>>;

    /// Look up a task by id.
    fn get(&self, id: &str) -> BoxFuture<'_, Result<Option<Task>>>;
}

/// Task store backed by a process-local map. Lives exactly as long as the
/// server process.
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn put(&self, task: Task) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            debug!(task_id = %task.id, state = %task.status.state, "task stored");
            self.tasks.lock().unwrap().insert(task.id.clone(), task);
            Ok(())
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, Result<Option<Task>>> {
        let id = id.to_string();
        Box::pin(async move { Ok(self.tasks.lock().unwrap().get(&id).cloned()) })
    }
}
