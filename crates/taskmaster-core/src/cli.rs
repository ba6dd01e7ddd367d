use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::StatusFilter;
use crate::task::{Category, Priority, Recurrence};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tm",
    version,
    about = "TaskMaster: a local personal task tracker",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Data directory (defaults to TASKMASTER_DATA or ~/.taskmaster).
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a new task at the top of the list.
    Add {
        /// Task title (words are joined).
        #[arg(required = true)]
        title: Vec<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long, value_enum, default_value_t = Category::Personal)]
        category: Category,

        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,

        /// Due date: today, tomorrow, YYYY-MM-DD or YYYY-MM-DDTHH:MM.
        #[arg(long)]
        due: Option<String>,

        #[arg(long, value_enum, default_value_t = Recurrence::None)]
        recurring: Recurrence,
    },

    /// List tasks, optionally filtered.
    List {
        /// Case-insensitive title search.
        #[arg(long, short = 's')]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = StatusFilter::All)]
        status: StatusFilter,

        #[arg(long, value_enum)]
        category: Option<Category>,

        #[arg(long, value_enum)]
        priority: Option<Priority>,
    },

    /// Toggle completion on a task (completing a recurring task schedules
    /// its next occurrence).
    Done {
        /// Task id, or any unique prefix of it.
        id: String,
    },

    /// Edit fields of a task.
    Edit {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long, conflicts_with = "clear_description")]
        description: Option<String>,

        #[arg(long)]
        clear_description: bool,

        #[arg(long, value_enum)]
        category: Option<Category>,

        #[arg(long, value_enum)]
        priority: Option<Priority>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        #[arg(long)]
        clear_due: bool,

        #[arg(long, value_enum)]
        recurring: Option<Recurrence>,
    },

    /// Delete a task.
    Delete { id: String },

    /// Move a task to a new position (1-based) in the list.
    Move { id: String, position: usize },

    /// Replace the whole list order with the given id sequence.
    Reorder {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show task statistics and completion progress.
    Stats,

    /// Show tasks due today and whether the day is fully done.
    Today,

    /// Show or set the display name.
    Name { name: Option<String> },

    /// Show or change the dark-mode preference.
    Theme {
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeArg {
    Enabled,
    Disabled,
    Toggle,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
