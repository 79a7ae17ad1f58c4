//! Derived views over the task collection.
//!
//! Everything here is a pure function of its inputs: the collection is never
//! reordered in place and nothing is cached between calls.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::model::task::{Priority, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    TimeAsc,
    TimeDesc,
    PriorityAsc,
    PriorityDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        SortKey::TimeAsc,
        SortKey::TimeDesc,
        SortKey::PriorityAsc,
        SortKey::PriorityDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::TimeAsc => "timeAsc",
            SortKey::TimeDesc => "timeDesc",
            SortKey::PriorityAsc => "priorityAsc",
            SortKey::PriorityDesc => "priorityDesc",
        }
    }

    /// The key after this one, wrapping around.
    pub fn next(self) -> SortKey {
        let idx = SortKey::ALL.iter().position(|k| *k == self).unwrap_or(0);
        SortKey::ALL[(idx + 1) % SortKey::ALL.len()]
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort key: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub search_text: String,
    pub sort_key: SortKey,
    pub completed_only: bool,
}

impl TaskQuery {
    pub fn matches(&self, task: &Task) -> bool {
        if self.completed_only && !task.completed {
            return false;
        }
        let needle = self.search_text.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        [task.title.as_str(), task.message.as_str(), task.priority.as_str()]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

type Comparator = fn(&Task, &Task) -> Ordering;

const COMPARATORS: [(SortKey, Comparator); 4] = [
    (SortKey::TimeAsc, by_time_asc),
    (SortKey::TimeDesc, by_time_desc),
    (SortKey::PriorityAsc, by_priority_asc),
    (SortKey::PriorityDesc, by_priority_desc),
];

fn by_time_asc(a: &Task, b: &Task) -> Ordering {
    a.reminder_time.cmp(&b.reminder_time)
}

fn by_time_desc(a: &Task, b: &Task) -> Ordering {
    b.reminder_time.cmp(&a.reminder_time)
}

fn by_priority_asc(a: &Task, b: &Task) -> Ordering {
    compare_priority(a.priority, b.priority, SortKey::PriorityAsc)
}

fn by_priority_desc(a: &Task, b: &Task) -> Ordering {
    compare_priority(a.priority, b.priority, SortKey::PriorityDesc)
}

pub fn comparator(key: SortKey) -> Comparator {
    COMPARATORS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, cmp)| *cmp)
        .unwrap_or(COMPARATORS[0].1)
}

/// Fixed rank: High=1, Medium=2, Low=3.
pub fn priority_rank(priority: Priority) -> u8 {
    match priority {
        Priority::High => 1,
        Priority::Medium => 2,
        Priority::Low => 3,
    }
}

/// `PriorityAsc` orders by descending rank (Low first); `PriorityDesc` by
/// ascending rank (High first). Any other key compares equal.
pub fn compare_priority(a: Priority, b: Priority, key: SortKey) -> Ordering {
    let (a, b) = (priority_rank(a), priority_rank(b));
    match key {
        SortKey::PriorityAsc => b.cmp(&a),
        SortKey::PriorityDesc => a.cmp(&b),
        SortKey::TimeAsc | SortKey::TimeDesc => Ordering::Equal,
    }
}

/// Filters and orders `tasks` for display. Ties keep insertion order.
pub fn query_tasks<'a>(tasks: &'a [Task], query: &TaskQuery) -> Vec<&'a Task> {
    let mut view: Vec<&Task> = tasks.iter().filter(|t| query.matches(t)).collect();
    let cmp = comparator(query.sort_key);
    view.sort_by(|a, b| cmp(a, b));
    view
}
