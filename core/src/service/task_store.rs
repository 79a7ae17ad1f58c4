use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::{LookupError, PersistenceError, StoreError};
use crate::model::task::{Task, TaskDraft};
use crate::repository::TaskRepository;

/// Store handle shared between the presentation layer and the reminder monitor.
pub type SharedTaskStore<R> = Arc<Mutex<TaskStore<R>>>;

/// Owns the task collection. Every mutation is written through to the
/// repository before it returns.
pub struct TaskStore<R: TaskRepository> {
    repo: R,
    tasks: Vec<Task>,
}

impl<R: TaskRepository> TaskStore<R> {
    /// Loads the collection once from `repo`.
    pub fn open(repo: R) -> Self {
        let tasks = repo.load();
        tracing::info!(count = tasks.len(), "task store opened");
        Self { repo, tasks }
    }

    pub fn into_shared(self) -> SharedTaskStore<R> {
        Arc::new(Mutex::new(self))
    }

    pub fn add(&mut self, draft: &TaskDraft) -> Result<Task, StoreError> {
        let new_task = draft.validate().inspect_err(|e| {
            tracing::debug!(fields = ?e.field_names(), "rejected task draft");
        })?;
        let task = Task::new(new_task);
        self.tasks.push(task.clone());
        tracing::info!(task_id = %task.id, "task added");

        self.persist()?;
        Ok(task)
    }

    /// Removes the task with `id`. Returns whether one was present.
    pub fn remove(&mut self, id: &Uuid) -> Result<bool, PersistenceError> {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != *id);
        let removed = self.tasks.len() != before;
        if removed {
            tracing::info!(task_id = %id, "task removed");
        }

        self.persist()?;
        Ok(removed)
    }

    /// Flips `completed`. Returns the new value, or `None` if `id` is unknown.
    pub fn toggle_completion(&mut self, id: &Uuid) -> Result<Option<bool>, PersistenceError> {
        let toggled = self.tasks.iter_mut().find(|t| t.id == *id).map(|task| {
            task.completed = !task.completed;
            task.completed
        });
        if let Some(completed) = toggled {
            tracing::info!(task_id = %id, completed, "task completion toggled");
        }

        self.persist()?;
        Ok(toggled)
    }

    /// The collection in insertion order.
    pub fn list(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == *id)
    }

    /// Resolves a full id or a unique prefix of one (with or without hyphens).
    pub fn resolve_id(&self, prefix: &str) -> Result<Uuid, LookupError> {
        let needle = prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(LookupError::NotFound(prefix.to_string()));
        }

        let matches: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|t| {
                t.id.hyphenated().to_string().starts_with(&needle)
                    || t.id.simple().to_string().starts_with(&needle)
            })
            .map(|t| t.id)
            .collect();

        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(LookupError::NotFound(prefix.to_string())),
            _ => Err(LookupError::Ambiguous {
                prefix: prefix.to_string(),
                matches: matches.len(),
            }),
        }
    }

    fn persist(&self) -> Result<(), PersistenceError> {
        self.repo.save(&self.tasks).inspect_err(|e| {
            tracing::error!(error = %e, "failed to persist tasks; in-memory state is ahead of storage");
        })
    }
}
