pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileTaskRepository;
pub use memory::MemoryTaskRepository;
pub use traits::TaskRepository;

use std::collections::HashSet;

use crate::error::PersistenceError;
use crate::model::task::Task;

/// Name of the slot the collection lives under.
pub const TASKS_KEY: &str = "tasks";

pub(crate) fn encode_tasks(tasks: &[Task]) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(tasks)?)
}

pub(crate) fn decode_tasks(raw: &str) -> Vec<Task> {
    let mut tasks = match serde_json::from_str::<Vec<Task>>(raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(error = %e, "task slot is corrupt, starting empty");
            return Vec::new();
        }
    };

    // Ids must stay unique; keep the first record seen for each.
    let mut seen = HashSet::new();
    let before = tasks.len();
    tasks.retain(|t| seen.insert(t.id));
    if tasks.len() != before {
        tracing::warn!(dropped = before - tasks.len(), "dropped tasks with duplicate ids");
    }
    tasks
}
