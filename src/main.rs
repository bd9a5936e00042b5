use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, eyre};
use std::path::PathBuf;
use taskmanager::{
    Backend, CategoryFilter, Config, JsonlPreferences, Preferences, Progress, SqlitePreferences, Task, TaskCategory,
    TaskStore, ThemeMode, category_counts, empty_message,
};

#[derive(Parser)]
#[command(name = "taskmanager")]
#[command(about = "TaskManager CLI - Personal task list with categories and a theme preference")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task data (overrides config)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    /// Storage backend: jsonl or sqlite (overrides config)
    #[arg(short, long)]
    backend: Option<Backend>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a task
    Add {
        /// Task title
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,

        /// Category (work, personal, shopping, health, study, other)
        #[arg(short, long, default_value = "personal")]
        category: TaskCategory,
    },

    /// List tasks, optionally limited to one category
    List {
        #[arg(short, long)]
        category: Option<TaskCategory>,
    },

    /// Toggle completion of a task
    Toggle { id: i64 },

    /// Delete a task
    Delete { id: i64 },

    /// Delete all tasks and reset ids
    Clear,

    /// Show or set the theme (light, dark, system)
    Theme { mode: Option<ThemeMode> },

    /// Compact the JSONL journal
    Compact,
}

fn main() -> Result<()> {
    // Setup tracing
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.data_dir = path;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }

    match config.backend {
        Backend::Jsonl => {
            let mut prefs = JsonlPreferences::open_with_threshold(&config.data_dir, config.compact_threshold)?;
            if matches!(cli.command, Commands::Compact) {
                let live = prefs.compact()?;
                println!("Compacted journal to {} entries", live);
                return Ok(());
            }
            run(&mut TaskStore::new(prefs), cli.command)
        }
        Backend::Sqlite => {
            let prefs = SqlitePreferences::open(&config.data_dir)?;
            run(&mut TaskStore::new(prefs), cli.command)
        }
    }
}

fn run<P: Preferences>(store: &mut TaskStore<P>, command: Commands) -> Result<()> {
    match command {
        Commands::Add { title, category } => match add(store, &title, category)? {
            Some(task) => println!("Added {}", format_task(&task)),
            None => println!("Added task"),
        },
        Commands::List { category } => {
            let tasks = store.load_tasks()?;
            print_list(&tasks, CategoryFilter::from(category));
        }
        Commands::Toggle { id } => {
            store.toggle_task_completion(id)?;
            match store.load_tasks()?.iter().find(|t| t.id == id) {
                Some(task) => println!("{}", format_task(task)),
                None => println!("No task with id {}", id),
            }
        }
        Commands::Delete { id } => {
            let before = store.load_tasks()?.len();
            store.delete_task(id)?;
            if store.load_tasks()?.len() < before {
                println!("Deleted task {}", id);
            } else {
                println!("No task with id {}", id);
            }
        }
        Commands::Clear => {
            store.clear_all_tasks()?;
            println!("All tasks cleared");
        }
        Commands::Theme { mode } => match mode {
            Some(mode) => {
                store.save_theme(mode)?;
                println!("Theme set to {}", mode.label());
            }
            None => {
                let current = store.load_theme()?;
                for mode in ThemeMode::ALL {
                    let marker = if mode == current { "(*)" } else { "( )" };
                    println!("{} {}", marker, mode.label());
                }
            }
        },
        Commands::Compact => {
            return Err(eyre!("Compact is only supported by the jsonl backend"));
        }
    }

    Ok(())
}

/// Add a task from command-line words and read it back from the store
fn add<P: Preferences>(store: &mut TaskStore<P>, words: &[String], category: TaskCategory) -> Result<Option<Task>> {
    let input = words.join(" ");
    let task = Task::draft(&input, category).ok_or_else(|| eyre!("Task title cannot be blank"))?;
    let next_id = store.add_task(task)?;

    // The store only returns the counter; the new task holds the one before it
    let tasks = store.load_tasks()?;
    Ok(tasks.into_iter().find(|t| t.id == next_id - 1))
}

fn print_list(tasks: &[Task], filter: CategoryFilter) {
    println!("{}", "My Tasks".bold());

    if !tasks.is_empty() {
        let chips: Vec<String> = category_counts(tasks)
            .into_iter()
            .map(|(category, count)| {
                let chip = format!("{} ({})", category.display_name(), count);
                if filter.category() == Some(category) { chip.bold().underline().to_string() } else { chip }
            })
            .collect();
        println!("All | {}", chips.join(" | "));
    }

    let visible = filter.apply(tasks);
    if visible.is_empty() {
        println!("{}", empty_message(tasks.is_empty()).dimmed());
        return;
    }

    println!("{}", Progress::of(visible.iter().copied()).label(filter));
    for task in visible {
        println!("  {}", format_task(task));
    }
}

fn format_task(task: &Task) -> String {
    let (r, g, b) = task.category.rgb();
    let check = if task.is_completed { "[x]" } else { "[ ]" };
    let title = if task.is_completed {
        task.title.strikethrough().dimmed().to_string()
    } else {
        task.title.clone()
    };
    format!(
        "{} #{} {} {}",
        check,
        task.id,
        title,
        task.category.display_name().truecolor(r, g, b)
    )
}
