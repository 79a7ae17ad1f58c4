pub mod app;
pub mod ui;

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use taskminder_core::{FileTaskRepository, ReminderMonitor, Settings, TaskStore};

use crate::tui::app::{App, InputMode};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(store: TaskStore<FileTaskRepository>, settings: &Settings) -> Result<()> {
    // The monitor runs on a background runtime; the UI loop stays synchronous.
    let runtime = tokio::runtime::Runtime::new()?;
    let store = store.into_shared();
    let mut app = App::new(store.clone());
    {
        let _enter = runtime.enter();
        app.reminders = Some(ReminderMonitor::new(store, settings.reminder.clone()).spawn());
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Some(reminders) = app.reminders.take() {
        reminders.cancel();
        runtime.block_on(reminders.shutdown());
    }

    if let Err(err) = res {
        tracing::error!(error = %err, "tui exited with error");
        println!("{:?}", err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal
            .draw(|f| ui::draw(f, app))
            .map_err(|e| io::Error::other(e.to_string()))?;

        // Wake up regularly so banners appear and clear without a keypress.
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.input_mode {
            InputMode::Normal => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_status(),
                KeyCode::Char('d') | KeyCode::Delete => app.delete_task(),
                KeyCode::Char('a') => app.enter_add_mode(),
                KeyCode::Char('/') => app.enter_search_mode(),
                KeyCode::Char('s') => app.cycle_sort(),
                KeyCode::Char('c') => app.toggle_completed_filter(),
                KeyCode::Char('r') => app.reload_tasks(),
                _ => {}
            },
            InputMode::Adding | InputMode::Searching => match key.code {
                KeyCode::Enter => app.submit_command(),
                KeyCode::Esc => app.exit_input_mode(),
                KeyCode::Char(c) => app.input_char(c),
                KeyCode::Backspace => app.delete_char(),
                KeyCode::Left => app.move_cursor_left(),
                KeyCode::Right => app.move_cursor_right(),
                _ => {}
            },
        }
    }
}
