use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::PersistenceError;
use crate::model::task::Task;
use crate::repository::traits::TaskRepository;
use crate::repository::{decode_tasks, encode_tasks};

/// In-memory slot. Clones share the same slot, so a test can keep a handle
/// after moving one into a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryTaskRepository {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    slot: Mutex<Option<String>>,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the slot with raw text, valid or not.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        let repo = Self::default();
        *repo.inner.slot.lock() = Some(raw.into());
        repo
    }

    /// Makes every subsequent `save` fail as if the medium were full.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }
}

impl TaskRepository for MemoryTaskRepository {
    fn load(&self) -> Vec<Task> {
        match self.inner.slot.lock().as_deref() {
            Some(raw) => decode_tasks(raw),
            None => Vec::new(),
        }
    }

    fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError> {
        if self.inner.reject_writes.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("quota exceeded".to_string()));
        }
        let encoded = encode_tasks(tasks)?;
        *self.inner.slot.lock() = Some(encoded);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
