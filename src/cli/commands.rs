use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fm", about = concat!("flowmark v", env!("CARGO_PKG_VERSION"), " - a markdown file that is also your task list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Look for the project starting here instead of the working directory
    #[arg(short = 'C', long = "project-dir", global = true)]
    pub project_dir: Option<String>,

    /// Evaluate @today/@tomorrow against this time (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
    #[arg(long, global = true)]
    pub now: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new flowmark project in the current directory
    Init(InitArgs),
    /// List tasks derived from the document
    List(ListArgs),
    /// Show the available views with task counts
    Views,
    /// Toggle a task's checkbox
    Toggle(ToggleArgs),
    /// Run the parser self-check
    Check,
    /// Write the document to a file
    Export(ExportArgs),
    /// Replace the document with the contents of a file
    Import(ImportArgs),
    /// Re-list tasks whenever the document changes on disk
    Watch(WatchArgs),
    /// Show text that failed to load or save
    Recovery(RecoveryArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Document file name inside flowmark/ (default: tasks.md)
    #[arg(long)]
    pub file: Option<String>,
    /// Reinitialize even if flowmark/ already exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// View to list: inbox, today, all, or a section name (default: all)
    #[arg(long)]
    pub view: Option<String>,
    /// Filter by tag (without the #)
    #[arg(long)]
    pub tag: Option<String>,
    /// Keep document order instead of sorting open tasks first
    #[arg(long)]
    pub document_order: bool,
}

#[derive(Args)]
pub struct WatchArgs {
    /// View to list: inbox, today, all, or a section name (default: all)
    #[arg(long)]
    pub view: Option<String>,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Task id, or a unique prefix of one
    #[arg(required_unless_present = "line", conflicts_with = "line")]
    pub id: Option<String>,
    /// Toggle the `- ` line at this 1-based line number instead
    #[arg(long)]
    pub line: Option<usize>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file
    pub file: String,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Markdown file to read
    pub file: String,
}

#[derive(Args)]
pub struct RecoveryArgs {
    #[command(subcommand)]
    pub command: Option<RecoveryCommand>,
    /// Show at most this many entries, newest first
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Subcommand)]
pub enum RecoveryCommand {
    /// Delete expired entries from the log
    Prune(PruneArgs),
    /// Print where the log lives
    Path,
}

#[derive(Args)]
pub struct PruneArgs {
    /// Cutoff, YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS (default: 30 days back)
    #[arg(long, conflicts_with = "all")]
    pub before: Option<String>,
    /// Empty the log entirely
    #[arg(long)]
    pub all: bool,
}
