use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use taskboard_domain::{BoardId, Priority, SubtaskId, TaskId};

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "A personal task board with drag-to-reorder", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the board data file (or set TASKBOARD_FILE env var)
    #[arg(long, short, value_name = "FILE", env = "TASKBOARD_FILE", global = true)]
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a board
    Init {
        #[arg(long)]
        board: String,
    },
    /// Task operations
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },
    /// Subtask operations
    Subtask {
        #[command(subcommand)]
        action: SubtaskAction,
    },
    /// Show a board in display order
    List {
        #[arg(long)]
        board: Option<BoardId>,
    },
    /// Drag the item at FROM and drop it at TO
    Move {
        from: usize,
        to: usize,
        #[arg(long)]
        board: Option<BoardId>,
    },
    /// Complete or reopen a task
    ToggleTask { id: TaskId },
    /// Complete or reopen a subtask
    ToggleSubtask { id: SubtaskId },
    /// Show tasks due today, tomorrow or at the highest priority
    Agenda {
        #[arg(value_enum)]
        scope: AgendaScope,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Append a task to a board
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        board: Option<BoardId>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<PriorityArg>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Due time (HH:MM:SS), requires --due
        #[arg(long)]
        time: Option<NaiveTime>,
    },
}

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Append a subtask to a task
    Add {
        #[arg(long)]
        task: TaskId,
        #[arg(long)]
        name: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AgendaScope {
    Today,
    Tomorrow,
    Urgent,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::Low => Priority::Low,
            PriorityArg::Medium => Priority::Medium,
            PriorityArg::High => Priority::High,
            PriorityArg::Urgent => Priority::Urgent,
        }
    }
}
