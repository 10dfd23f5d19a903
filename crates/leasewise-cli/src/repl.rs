//! Interactive REPL (Read-Eval-Print Loop) mode.

use crate::commands;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use leasewise_domain::SummaryKind;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt::Display;
use std::path::PathBuf;

const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Run the interactive REPL, optionally loading `initial` first.
pub async fn run_repl<L, E>(
    workspace: &mut Workspace<L, E>,
    formatter: &Formatter,
    history_size: usize,
    initial: Option<PathBuf>,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    println!("{}", formatter.info("Leasewise REPL - Type 'help' for commands, 'exit' to quit"));
    println!();

    let editor_config = rustyline::Config::builder()
        .max_history_size(history_size)
        .map_err(editor_error)?
        .auto_add_history(false)
        .build();
    let mut editor = DefaultEditor::with_config(editor_config).map_err(editor_error)?;

    let history_path = workspace.paths().root.join("repl_history.txt");
    let _ = editor.load_history(&history_path);

    if let Some(file) = initial {
        if let Err(e) = execute(ReplCommand::Load(file), workspace, formatter).await {
            eprintln!("{}", formatter.error(&e.to_string()));
        }
    }

    loop {
        let prompt = match workspace.statistics().active_document {
            Some(name) => format!("leasewise [{}]> ", name),
            None => "leasewise> ".to_string(),
        };

        match editor.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute(cmd, workspace, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use 'exit' to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    editor.save_history(&history_path).ok();

    Ok(())
}

fn editor_error(e: ReadlineError) -> CliError {
    CliError::Io(std::io::Error::other(format!("Failed to initialize editor: {}", e)))
}

/// REPL command type.
#[derive(Debug, PartialEq)]
enum ReplCommand {
    Exit,
    Help,
    Load(PathBuf),
    Ask(String),
    Summary(SummaryKind),
    Extract { parallel: bool },
    Clear,
    Forget,
    Stats,
    History(usize),
    Save,
}

/// Parse a REPL command line; anything that is not a command is a question.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    match word.to_lowercase().as_str() {
        "exit" | "quit" | "q" => Ok(ReplCommand::Exit),
        "help" | "?" => Ok(ReplCommand::Help),
        "load" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput("Usage: load <file>".to_string()));
            }
            Ok(ReplCommand::Load(PathBuf::from(rest)))
        }
        "ask" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput("Usage: ask <question>".to_string()));
            }
            Ok(ReplCommand::Ask(rest.to_string()))
        }
        "summary" | "summarize" => {
            let kind = if rest.is_empty() {
                SummaryKind::Brief
            } else {
                rest.parse().map_err(CliError::InvalidInput)?
            };
            Ok(ReplCommand::Summary(kind))
        }
        "extract" => match rest {
            "" => Ok(ReplCommand::Extract { parallel: false }),
            "parallel" | "--parallel" => Ok(ReplCommand::Extract { parallel: true }),
            other => Err(CliError::InvalidInput(format!(
                "Unknown extract option: {}",
                other
            ))),
        },
        "clear" => Ok(ReplCommand::Clear),
        "forget" => Ok(ReplCommand::Forget),
        "stats" => Ok(ReplCommand::Stats),
        "history" => {
            let limit = if rest.is_empty() {
                DEFAULT_HISTORY_LIMIT
            } else {
                rest.parse()
                    .map_err(|_| CliError::InvalidInput(format!("Not a number: {}", rest)))?
            };
            Ok(ReplCommand::History(limit))
        }
        "save" => Ok(ReplCommand::Save),
        _ => Ok(ReplCommand::Ask(line.to_string())),
    }
}

/// Execute a REPL command.
async fn execute<L, E>(
    cmd: ReplCommand,
    workspace: &mut Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    match cmd {
        ReplCommand::Load(file) => {
            let report = workspace.load(&file)?;
            println!("{}", formatter.format_load(&report)?);
        }
        ReplCommand::Ask(question) => {
            commands::execute_ask(&question, workspace, formatter).await?;
        }
        ReplCommand::Summary(kind) => {
            commands::execute_summarize(kind, false, workspace, formatter).await?;
        }
        ReplCommand::Extract { parallel } => {
            commands::execute_extract(parallel, false, workspace, formatter).await?;
        }
        ReplCommand::Clear => {
            workspace.clear();
            println!("{}", formatter.success("Contract unloaded and conversation cleared"));
        }
        ReplCommand::Forget => {
            workspace.clear_memory();
            println!("{}", formatter.success("Conversation cleared"));
        }
        ReplCommand::Stats => {
            println!("{}", formatter.info(&workspace.rag().current_document_info()));
            commands::execute_stats(workspace, formatter)?;
        }
        ReplCommand::History(limit) => {
            commands::execute_history(limit, workspace, formatter)?;
        }
        ReplCommand::Save => {
            commands::execute_save(workspace, formatter)?;
        }
        ReplCommand::Exit | ReplCommand::Help => {}
    }

    Ok(())
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  load <file>                    - Load a contract (replaces the current one)");
    println!("  ask <question>                 - Ask about the contract");
    println!("  <question>                     - Same as ask");
    println!("  summary [kind]                 - Summarize (brief|comprehensive|key_points)");
    println!("  extract [parallel]             - Extract the structured record");
    println!("  clear                          - Unload the contract and conversation");
    println!("  forget                         - Clear the conversation only");
    println!("  stats                          - Show session statistics");
    println!("  history [n]                    - Show stored questions and answers");
    println!("  save                           - Save the vector index");
    println!("  help, ?                        - Show this help");
    println!("  exit, quit, q                  - Exit REPL");
    println!();
}
