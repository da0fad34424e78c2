use clap::{Parser, Subcommand, ValueEnum};
use taskdeck_core::{Priority, StatusFilter, TaskSort};

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "A task tracker with filters, priorities and due dates")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_version = concat!(
    "v",
    env!("CARGO_PKG_VERSION"),
    "\nCodeName: ",
    env!("CODENAME")
))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PriorityArg {
    High,
    Medium,
    Low,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::High => Priority::High,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::Low => Priority::Low,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StatusArg {
    All,
    Active,
    Completed,
    Overdue,
}

impl From<StatusArg> for StatusFilter {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::All => StatusFilter::All,
            StatusArg::Active => StatusFilter::Active,
            StatusArg::Completed => StatusFilter::Completed,
            StatusArg::Overdue => StatusFilter::Overdue,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SortBy {
    DateCreated,
    Priority,
    DueDate,
    Title,
}

impl From<SortBy> for TaskSort {
    fn from(arg: SortBy) -> Self {
        match arg {
            SortBy::DateCreated => TaskSort::DateCreated,
            SortBy::Priority => TaskSort::Priority,
            SortBy::DueDate => TaskSort::DueDate,
            SortBy::Title => TaskSort::Title,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Adds a task
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
        /// Longer description of the task
        #[arg(long = "desc", short = 'D', value_name = "TEXT", default_value = "")]
        description: String,
        /// Category for the task (defaults to Personal)
        #[arg(long, short = 'C', value_name = "CATEGORY")]
        category: Option<String>,
        /// Priority of the task (defaults to medium)
        #[arg(long, short = 'p', value_enum)]
        priority: Option<PriorityArg>,
        /// Due date, e.g. 2026-01-25, tomorrow, next friday, in 3 days
        #[arg(long, short = 'd', value_name = "DATE")]
        due: Option<String>,
    },

    /// Lists tasks with filtering and sorting
    List {
        /// Show only tasks in this category
        #[arg(long, short = 'C', value_name = "CATEGORY")]
        category: Option<String>,
        /// Show only tasks with this priority
        #[arg(long, short = 'p', value_enum)]
        priority: Option<PriorityArg>,
        /// Show only tasks in this state
        #[arg(long, value_enum, default_value = "all")]
        status: StatusArg,
        /// Filter tasks whose title or description contains text (case-sensitive)
        #[arg(long, short = 's', value_name = "TERM")]
        search: Option<String>,
        /// Sort tasks by field
        #[arg(long, value_enum, default_value = "date-created")]
        sort: SortBy,
        /// Use compact one-line format
        #[arg(long, short = 'c')]
        compact: bool,
        /// Use detailed format with full info
        #[arg(long)]
        detailed: bool,
        /// Disable colors
        #[arg(long)]
        no_color: bool,
    },

    /// Shows one task in detail
    Show {
        #[arg(value_parser = clap::value_parser!(u32))]
        id: u32,
    },

    /// Edit a task; fields not given keep their current value
    Edit {
        #[arg(value_parser = clap::value_parser!(u32))]
        id: u32,
        /// New title
        #[arg(long, value_name = "TITLE")]
        title: Option<String>,
        /// New description
        #[arg(long = "desc", value_name = "TEXT")]
        description: Option<String>,
        /// New category
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,
        /// New priority
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// New due date (use 'none' to clear)
        #[arg(long, value_name = "DATE")]
        due: Option<String>,
    },

    /// Toggles task completion status
    #[command(visible_alias = "check")]
    Toggle {
        #[arg(value_parser = clap::value_parser!(u32))]
        id: u32,
    },

    /// Removes a task
    Remove {
        #[arg(value_parser = clap::value_parser!(u32))]
        id: u32,
    },

    /// Clear completed tasks
    Clear {
        /// Remove only completed tasks
        #[arg(long)]
        completed: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// List all categories
    Categories,

    /// Show summary counts
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Recover tasks from backup file
    Recover {
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Serve the HTTP interface
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides config)
        #[arg(long, short = 'P')]
        port: Option<u16>,
    },
}
