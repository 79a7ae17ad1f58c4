use ratatui::widgets::TableState;
use taskminder_core::{
    draft_from_args, query_tasks, FileTaskRepository, Notification, ReminderHandle,
    SharedTaskStore, StoreError, Task, TaskQuery,
};

pub enum InputMode {
    Normal,
    Adding,
    Searching,
}

pub struct App {
    pub store: SharedTaskStore<FileTaskRepository>,
    pub query: TaskQuery,
    pub tasks: Vec<Task>,
    pub total: usize,
    pub state: TableState,
    pub input: String,
    pub input_mode: InputMode,
    pub cursor_position: usize,
    pub status: Option<String>,
    pub reminders: Option<ReminderHandle>,
}

impl App {
    pub fn new(store: SharedTaskStore<FileTaskRepository>) -> App {
        let mut app = App {
            store,
            query: TaskQuery::default(),
            tasks: Vec::new(),
            total: 0,
            state: TableState::default(),
            input: String::new(),
            input_mode: InputMode::Normal,
            cursor_position: 0,
            status: None,
            reminders: None,
        };
        app.reload_tasks();
        if !app.tasks.is_empty() {
            app.state.select(Some(0));
        }
        app
    }

    pub fn banner(&self) -> Option<Notification> {
        self.reminders.as_ref().and_then(|r| r.banner())
    }

    pub fn next(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(i) if i + 1 < self.tasks.len() => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.tasks.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(0) | None => self.tasks.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    fn selected_id(&self) -> Option<uuid::Uuid> {
        self.state
            .selected()
            .and_then(|i| self.tasks.get(i))
            .map(|t| t.id)
    }

    pub fn toggle_status(&mut self) {
        let Some(id) = self.selected_id() else { return };
        let result = self.store.lock().toggle_completion(&id);
        if let Err(e) = result {
            self.status = Some(format!("Not saved: {}", e));
        }
        self.reload_tasks();
        self.clamp_selection();
    }

    pub fn delete_task(&mut self) {
        let Some(id) = self.selected_id() else { return };
        let result = self.store.lock().remove(&id);
        if let Err(e) = result {
            self.status = Some(format!("Not saved: {}", e));
        }
        self.reload_tasks();
        self.clamp_selection();
    }

    pub fn cycle_sort(&mut self) {
        self.query.sort_key = self.query.sort_key.next();
        self.reload_tasks();
    }

    pub fn toggle_completed_filter(&mut self) {
        self.query.completed_only = !self.query.completed_only;
        self.reload_tasks();
        self.clamp_selection();
    }

    /// Re-runs the query against the store.
    pub fn reload_tasks(&mut self) {
        let store = self.store.lock();
        self.total = store.list().len();
        self.tasks = query_tasks(store.list(), &self.query)
            .into_iter()
            .cloned()
            .collect();
    }

    fn clamp_selection(&mut self) {
        if self.tasks.is_empty() {
            self.state.select(None);
        } else {
            let i = self.state.selected().unwrap_or(0).min(self.tasks.len() - 1);
            self.state.select(Some(i));
        }
    }

    pub fn enter_add_mode(&mut self) {
        self.input_mode = InputMode::Adding;
        self.input.clear();
        self.cursor_position = 0;
        self.status = None;
    }

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Searching;
        self.input = self.query.search_text.clone();
        self.cursor_position = self.input.chars().count();
        self.status = None;
    }

    pub fn exit_input_mode(&mut self) {
        if matches!(self.input_mode, InputMode::Searching) {
            self.query.search_text.clear();
            self.reload_tasks();
            self.clamp_selection();
        }
        self.input_mode = InputMode::Normal;
    }

    pub fn input_char(&mut self, c: char) {
        let byte_index = self.byte_index(self.cursor_position);
        self.input.insert(byte_index, c);
        self.cursor_position += 1;
        self.on_input_changed();
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            let byte_index = self.byte_index(self.cursor_position - 1);
            self.input.remove(byte_index);
            self.cursor_position -= 1;
            self.on_input_changed();
        }
    }

    fn byte_index(&self, char_pos: usize) -> usize {
        self.input.chars().take(char_pos).map(|c| c.len_utf8()).sum()
    }

    // Search filters as you type.
    fn on_input_changed(&mut self) {
        if matches!(self.input_mode, InputMode::Searching) {
            self.query.search_text = self.input.clone();
            self.reload_tasks();
            self.clamp_selection();
        }
    }

    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn submit_command(&mut self) {
        match self.input_mode {
            InputMode::Adding => {
                if !self.input.trim().is_empty() && !self.submit_add() {
                    // Keep the form open so the user can fix it.
                    return;
                }
            }
            InputMode::Searching => {}
            InputMode::Normal => return,
        }

        self.input.clear();
        self.cursor_position = 0;
        self.input_mode = InputMode::Normal;
    }

    /// Returns whether the form can be closed.
    fn submit_add(&mut self) -> bool {
        let args: Vec<String> = self.input.split_whitespace().map(|s| s.to_string()).collect();
        let draft = match draft_from_args(&args) {
            Ok(draft) => draft,
            Err(e) => {
                self.status = Some(e.to_string());
                return false;
            }
        };

        let result = self.store.lock().add(&draft);
        match result {
            Ok(task) => {
                self.reload_tasks();
                let pos = self.tasks.iter().position(|t| t.id == task.id);
                self.state.select(pos);
                if pos.is_none() {
                    self.clamp_selection();
                }
                true
            }
            Err(StoreError::Validation(e)) => {
                self.status = Some(format!("Fix {}", e));
                false
            }
            Err(StoreError::Persistence(e)) => {
                self.status = Some(format!("Added but not saved: {}", e));
                self.reload_tasks();
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskminder_core::{TaskDraft, TaskStore};
    use tempfile::{tempdir, TempDir};

    fn app_with(drafts: &[TaskDraft]) -> (App, TempDir) {
        let dir = tempdir().unwrap();
        let repo = FileTaskRepository::new(dir.path()).unwrap();
        let mut store = TaskStore::open(repo);
        for d in drafts {
            store.add(d).unwrap();
        }
        (App::new(store.into_shared()), dir)
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.input_char(c);
        }
    }

    #[test]
    fn test_add_through_form() {
        let (mut app, _dir) = app_with(&[]);
        app.enter_add_mode();
        type_str(&mut app, "Pay rent m:landlord a:2024-01-01T10:00 p:h");
        app.submit_command();

        assert!(matches!(app.input_mode, InputMode::Normal));
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.tasks[0].title, "Pay rent");
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_invalid_form_stays_open() {
        let (mut app, _dir) = app_with(&[]);
        app.enter_add_mode();
        type_str(&mut app, "Only a title");
        app.submit_command();

        assert!(matches!(app.input_mode, InputMode::Adding));
        assert!(app.status.as_deref().unwrap().contains("message"));
        assert!(app.tasks.is_empty());
    }

    #[test]
    fn test_search_sort_and_filter() {
        let (mut app, _dir) = app_with(&[
            TaskDraft::new("A", "m1", "2024-01-01T10:00", "High"),
            TaskDraft::new("B", "m2", "2024-01-01T09:00", "Low"),
        ]);
        let titles = |app: &App| app.tasks.iter().map(|t| t.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&app), vec!["B", "A"]);

        app.cycle_sort();
        assert_eq!(titles(&app), vec!["A", "B"]);

        app.enter_search_mode();
        type_str(&mut app, "low");
        assert_eq!(titles(&app), vec!["B"]);
        app.exit_input_mode();
        assert_eq!(app.tasks.len(), 2);

        app.state.select(Some(0));
        app.toggle_status();
        app.toggle_completed_filter();
        assert_eq!(titles(&app), vec!["A"]);
        assert_eq!(app.total, 2);
    }

    #[test]
    fn test_delete_adjusts_selection() {
        let (mut app, _dir) = app_with(&[
            TaskDraft::new("A", "m1", "2024-01-01T10:00", "High"),
            TaskDraft::new("B", "m2", "2024-01-01T09:00", "Low"),
        ]);
        app.state.select(Some(1));
        app.delete_task();
        assert_eq!(app.tasks.len(), 1);
        assert_eq!(app.state.selected(), Some(0));

        app.delete_task();
        assert!(app.tasks.is_empty());
        assert_eq!(app.state.selected(), None);
    }
}
