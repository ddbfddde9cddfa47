use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

#[derive(Debug, Parser)]
#[command(
    name = "partseek",
    about = "Find part numbers in extracted technical manuals"
)]
pub struct Cli {
    /// Path to a JSON config file (overrides PARTSEEK_CONFIG and XDG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search documents for a component and its part number
    Search(SearchArgs),
    /// Interactive session reading queries from stdin
    Chat(ChatArgs),
    /// List index pages and the page references they contain
    Inspect(InspectArgs),
    /// Classify values as item numbers or part numbers
    Classify(ClassifyArgs),
    /// Extract a page reference from a context string
    Refs(RefsArgs),
    /// Generate shell completions
    #[command(hide = true)]
    Completions(CompletionsArgs),
}

// -- Search --

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// The search query
    pub query: String,

    /// Documents to search (.txt pages split by form feed, or .json)
    #[arg(short = 'd', long = "document", required = true)]
    pub documents: Vec<PathBuf>,

    /// Number of results to return (defaults to the configured maximum)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Return all results above the score threshold
    #[arg(long, conflicts_with = "count")]
    pub all: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,

    /// Do not follow index hits to their content page
    #[arg(long)]
    pub no_follow: bool,
}

// -- Chat --

#[derive(Debug, Parser)]
pub struct ChatArgs {
    /// Documents to search
    #[arg(short = 'd', long = "document", required = true)]
    pub documents: Vec<PathBuf>,

    /// Number of results shown per query
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,

    /// Print each turn's results as one JSON line
    #[arg(long)]
    pub json: bool,
}

// -- Inspect --

#[derive(Debug, Parser)]
pub struct InspectArgs {
    /// Document to inspect
    pub document: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Classify --

#[derive(Debug, Parser)]
pub struct ClassifyArgs {
    /// Values to classify
    #[arg(required = true)]
    pub values: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Refs --

#[derive(Debug, Parser)]
pub struct RefsArgs {
    /// Context text, e.g. "5 Primary Element"
    pub context: String,

    /// Page the context was found on
    #[arg(short, long)]
    pub page: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

// -- Completions --

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

impl CompletionsArgs {
    /// Generate shell completions and print to stdout.
    pub fn generate(&self) {
        let mut cmd = Cli::command();
        clap_complete::generate(
            self.shell,
            &mut cmd,
            "partseek",
            &mut std::io::stdout(),
        );
    }
}
