pub mod query;
pub mod reminder;
pub mod task_store;
