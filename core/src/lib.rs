pub mod error;
pub mod input;
pub mod model;
pub mod repository;
pub mod service;
pub mod settings;
pub mod time;

pub use error::{LookupError, PersistenceError, SettingsError, StoreError, TaskField, ValidationError};
pub use input::{draft_from_args, expand_key, parse_args, ParsedInput};
pub use model::task::{NewTask, Priority, Task, TaskDraft};
pub use repository::{FileTaskRepository, MemoryTaskRepository, TaskRepository};
pub use service::query::{query_tasks, SortKey, TaskQuery};
pub use service::reminder::{Notification, ReminderHandle, ReminderMonitor, TaskSource};
pub use service::task_store::{SharedTaskStore, TaskStore};
pub use settings::{ReminderSettings, Settings};
pub use time::{parse_duration, parse_reminder_time};
