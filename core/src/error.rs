use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A user-supplied field of a task candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Title,
    Message,
    ReminderTime,
    Priority,
}

impl TaskField {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskField::Title => "title",
            TaskField::Message => "message",
            TaskField::ReminderTime => "reminderTime",
            TaskField::Priority => "priority",
        }
    }
}

impl fmt::Display for TaskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One or more required fields were empty or unparseable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing or invalid fields: {}", join_fields(.fields))]
pub struct ValidationError {
    pub fields: Vec<TaskField>,
}

impl ValidationError {
    pub fn field_names(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.as_str()).collect()
    }
}

fn join_fields(fields: &[TaskField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The storage medium rejected a write.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write task slot at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by mutating store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Resolving a shortened id against the collection failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no task matches id {0}")]
    NotFound(String),
    #[error("id {prefix} is ambiguous ({matches} tasks match)")]
    Ambiguous { prefix: String, matches: usize },
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_fields_in_order() {
        let err = ValidationError {
            fields: vec![TaskField::Title, TaskField::ReminderTime],
        };
        assert_eq!(err.field_names(), vec!["title", "reminderTime"]);
        assert_eq!(err.to_string(), "missing or invalid fields: title, reminderTime");
    }

    #[test]
    fn test_store_error_is_transparent() {
        let err: StoreError = PersistenceError::Unavailable("quota exceeded".to_string()).into();
        assert_eq!(err.to_string(), "storage unavailable: quota exceeded");
    }
}
