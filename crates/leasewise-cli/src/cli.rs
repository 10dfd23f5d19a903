//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use leasewise_domain::SummaryKind;
use std::path::PathBuf;

/// Leasewise - ask questions about rental contracts.
#[derive(Debug, Parser)]
#[command(name = "leasewise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "LEASEWISE_CONFIG")]
    pub config: Option<PathBuf>,

    /// User whose data directory to use
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// More logging on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (bare values)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load a contract and show extraction statistics
    Load(LoadArgs),

    /// Ask a question about a contract
    Ask(AskArgs),

    /// Summarize a contract
    Summarize(SummarizeArgs),

    /// Extract the structured contract record
    Extract(ExtractArgs),

    /// Show session statistics for a contract
    Stats(FileArgs),

    /// Show stored questions and answers for a contract
    History(HistoryArgs),

    /// Save a contract's vector index to the user's data directory
    Save(FileArgs),

    /// Show or switch the active user
    User(UserArgs),

    /// Enter interactive REPL mode
    Repl(ReplArgs),
}

/// A contract file.
#[derive(Debug, Args)]
pub struct FileArgs {
    /// Contract file (PDF, text or Markdown)
    pub file: PathBuf,
}

/// Arguments for the load command.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Contract file (PDF, text or Markdown)
    pub file: PathBuf,

    /// Neither read nor write the chunk cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the ask command.
#[derive(Debug, Args)]
pub struct AskArgs {
    /// Contract file
    pub file: PathBuf,

    /// The question
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,
}

impl AskArgs {
    /// The question words joined back together
    pub fn question(&self) -> String {
        self.question.join(" ")
    }
}

/// Arguments for the summarize command.
#[derive(Debug, Args)]
pub struct SummarizeArgs {
    /// Contract file
    pub file: PathBuf,

    /// Summary style
    #[arg(short, long, value_enum, default_value = "brief")]
    pub kind: KindArg,

    /// Ignore any stored summary
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the extract command.
#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Contract file
    pub file: PathBuf,

    /// Ask backfill questions concurrently
    #[arg(short, long)]
    pub parallel: bool,

    /// Ignore any stored record
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the history command.
#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Contract file
    pub file: PathBuf,

    /// Maximum number of exchanges
    #[arg(short, long, default_value = "20")]
    pub limit: usize,
}

/// Arguments for the repl command.
#[derive(Debug, Args)]
pub struct ReplArgs {
    /// Contract to load on start
    pub file: Option<PathBuf>,
}

/// Arguments for user management.
#[derive(Debug, Args)]
pub struct UserArgs {
    #[command(subcommand)]
    pub action: UserAction,
}

/// User management actions.
#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Show the active user and their data directory
    Show,

    /// List users with a data directory
    List,

    /// Make another user active
    Switch {
        /// User name
        name: String,
    },
}

/// Summary kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum KindArg {
    /// One or two prose paragraphs
    Brief,
    /// Sectioned summary of every important term
    Comprehensive,
    /// Numbered list of key points
    KeyPoints,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<KindArg> for SummaryKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Brief => SummaryKind::Brief,
            KindArg::Comprehensive => SummaryKind::Comprehensive,
            KindArg::KeyPoints => SummaryKind::KeyPoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_enters_repl() {
        let cli = Cli::parse_from(["leasewise"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_ask_joins_question_words() {
        let cli = Cli::parse_from(["leasewise", "ask", "lease.pdf", "What", "is", "the", "rent?"]);
        match cli.command {
            Some(Command::Ask(args)) => {
                assert_eq!(args.file, PathBuf::from("lease.pdf"));
                assert_eq!(args.question(), "What is the rent?");
            }
            _ => panic!("Expected Ask command"),
        }
    }

    #[test]
    fn test_summarize_kind() {
        let cli = Cli::parse_from(["leasewise", "summarize", "lease.pdf", "--kind", "key-points", "-vv"]);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Some(Command::Summarize(args)) => {
                assert_eq!(SummaryKind::from(args.kind), SummaryKind::KeyPoints);
                assert!(!args.refresh);
            }
            _ => panic!("Expected Summarize command"),
        }
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["leasewise", "ask", "lease.pdf"]).is_err());
    }
}
