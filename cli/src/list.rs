use tabled::settings::object::Rows;
use tabled::settings::{Color, Modify, Style};
use tabled::{Table, Tabled};
use taskminder_core::{query_tasks, Task, TaskQuery};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MESSAGE_WIDTH: usize = 40;

#[derive(Tabled)]
struct TaskRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "St")]
    status: &'static str,
    #[tabled(rename = "Reminder")]
    reminder: String,
    #[tabled(rename = "Pri")]
    priority: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.short_id(),
            status: if task.completed { "✔" } else { "☐" },
            reminder: task.reminder_time.format("%Y-%m-%d %H:%M").to_string(),
            priority: task.priority.to_string(),
            title: task.title.clone(),
            message: truncate(&task.message, MESSAGE_WIDTH),
        }
    }
}

pub fn show_tasks(tasks: &[Task], query: &TaskQuery) {
    if tasks.is_empty() {
        println!("No tasks available. Add a task!");
        return;
    }

    let view = query_tasks(tasks, query);
    if view.is_empty() {
        println!("No tasks match.");
        return;
    }

    let rows: Vec<TaskRow> = view.into_iter().map(TaskRow::from).collect();
    let mut table = Table::new(rows);
    table
        .with(Style::modern())
        .with(Modify::new(Rows::first()).with(Color::FG_CYAN));

    println!("{}", table);
    println!("sorted by {}", query.sort_key);
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with `…`.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width.saturating_sub(1) {
            out.push('…');
            return out;
        }
        used += w;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly_10", 10), "exactly_10");
    }

    #[test]
    fn test_truncate_counts_wide_chars() {
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
        assert_eq!(truncate("買い物リスト", 5), "買い…");
    }
}
