use crate::error::PersistenceError;
use crate::model::task::Task;

/// A durable slot holding the whole task collection.
pub trait TaskRepository {
    /// Returns the stored collection. Absent or corrupt data yields an empty
    /// collection.
    fn load(&self) -> Vec<Task>;

    /// Overwrites the slot with `tasks`.
    fn save(&self, tasks: &[Task]) -> Result<(), PersistenceError>;
}
