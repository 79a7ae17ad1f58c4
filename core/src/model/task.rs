use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{TaskField, ValidationError};
use crate::time::{parse_reminder_time, reminder_time_serde};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "h" | "high" => Ok(Priority::High),
            "m" | "med" | "medium" => Ok(Priority::Medium),
            "l" | "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    #[serde(with = "reminder_time_serde")]
    pub reminder_time: NaiveDateTime,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(new_task: NewTask) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new_task.title,
            message: new_task.message,
            reminder_time: new_task.reminder_time,
            priority: new_task.priority,
            completed: false,
        }
    }

    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.reminder_time <= now
    }
}

/// Task fields after validation, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub message: String,
    pub reminder_time: NaiveDateTime,
    pub priority: Priority,
}

/// An add candidate exactly as the user typed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub message: String,
    pub reminder_time: String,
    pub priority: String,
}

impl TaskDraft {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        reminder_time: impl Into<String>,
        priority: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            reminder_time: reminder_time.into(),
            priority: priority.into(),
        }
    }

    /// Checks every field and reports all offending ones at once.
    ///
    /// Blank text counts as missing; accepted text is kept verbatim. An
    /// unparseable reminder time or an unknown priority is reported under its
    /// field name as well.
    pub fn validate(&self) -> Result<NewTask, ValidationError> {
        let mut fields = Vec::new();

        if self.title.trim().is_empty() {
            fields.push(TaskField::Title);
        }
        if self.message.trim().is_empty() {
            fields.push(TaskField::Message);
        }
        let reminder_time = parse_reminder_time(&self.reminder_time).ok();
        if reminder_time.is_none() {
            fields.push(TaskField::ReminderTime);
        }
        let priority = self.priority.parse::<Priority>().ok();
        if priority.is_none() {
            fields.push(TaskField::Priority);
        }

        match (reminder_time, priority) {
            (Some(reminder_time), Some(priority)) if fields.is_empty() => Ok(NewTask {
                title: self.title.clone(),
                message: self.message.clone(),
                reminder_time,
                priority,
            }),
            _ => Err(ValidationError { fields }),
        }
    }
}
