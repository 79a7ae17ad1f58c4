mod list;
mod logging;
mod tui;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use taskminder_core::{
    draft_from_args, FileTaskRepository, ReminderMonitor, Settings, SortKey, StoreError,
    TaskQuery, TaskStore,
};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser)]
#[command(name = "taskminder")]
#[command(about = "Tasks with reminders, in your terminal", long_about = None)]
struct Cli {
    /// Directory holding tasks.json and settings.json (default: ~/.taskminder)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Add a task (usage: add Pay rent msg:transfer_to_landlord at:2025-01-01T09:00 pri:h)
    Add {
        /// Title words followed by message:/at:/priority: metadata
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// List tasks
    List {
        /// Case-insensitive text to look for in title, message or priority
        #[arg(long, short)]
        search: Option<String>,
        /// timeAsc, timeDesc, priorityAsc or priorityDesc
        #[arg(long, default_value_t = SortKey::TimeAsc)]
        sort: SortKey,
        /// Only show completed tasks
        #[arg(long)]
        completed: bool,
    },
    /// Toggle a task between open and completed
    Done {
        /// Task id or a unique prefix of it
        id: String,
    },
    /// Delete a task
    Rm {
        /// Task id or a unique prefix of it
        id: String,
    },
    /// Print reminders as they come due, until Ctrl-C
    Watch,
    /// Open the Terminal User Interface
    Tui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.data_dir.as_deref())?;
    let data_dir = settings.data_dir()?;

    match &cli.command {
        Some(Commands::Tui) | None => logging::init_file(&settings.log_level, &data_dir)?,
        Some(_) => logging::init_stderr(&settings.log_level),
    }

    let repo = FileTaskRepository::new(&data_dir)
        .with_context(|| format!("opening task storage in {}", data_dir.display()))?;
    let mut store = TaskStore::open(repo);

    match cli.command {
        Some(Commands::Add { args }) => {
            let draft = draft_from_args(&args)?;
            match store.add(&draft) {
                Ok(task) => {
                    println!("Task added: {} (ID: {})", task.title, task.short_id());
                    println!("  Reminder: {}", task.reminder_time.format("%Y-%m-%d %H:%M"));
                    println!("  Priority: {}", task.priority);
                }
                Err(StoreError::Validation(e)) => {
                    println!("Error: {}.", e);
                    println!("Usage: add <title> message:<text> at:<time> priority:<h|m|l>");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Some(Commands::List { search, sort, completed }) => {
            let query = TaskQuery {
                search_text: search.unwrap_or_default(),
                sort_key: sort,
                completed_only: completed,
            };
            list::show_tasks(store.list(), &query);
        }
        Some(Commands::Done { id }) => {
            let id = store.resolve_id(&id)?;
            if let Some(completed) = store.toggle_completion(&id)? {
                let state = if completed { "completed" } else { "reopened" };
                println!("Task {} {}.", &id.simple().to_string()[..8], state);
            }
        }
        Some(Commands::Rm { id }) => {
            let id = store.resolve_id(&id)?;
            if store.remove(&id)? {
                println!("Task {} deleted.", &id.simple().to_string()[..8]);
            }
        }
        Some(Commands::Watch) => watch(store, &settings)?,
        Some(Commands::Tui) | None => tui::run(store, &settings)?,
    }
    Ok(())
}

fn watch(store: TaskStore<FileTaskRepository>, settings: &Settings) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let monitor = ReminderMonitor::new(store.into_shared(), settings.reminder.clone());
        let mut events = monitor.subscribe();
        let handle = monitor.spawn();
        println!("Watching for reminders (Ctrl-C to stop)...");

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                event = events.recv() => match event {
                    Ok(n) => println!(
                        "[{}] {} ({}): {}",
                        chrono::Local::now().format("%H:%M"),
                        n.title,
                        n.priority,
                        n.message
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "reminder output fell behind");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        handle.shutdown().await;
    });
    Ok(())
}
