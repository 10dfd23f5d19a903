//! Load and save command implementations.

use crate::cli::LoadArgs;
use crate::error::Result;
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use std::fmt::Display;

/// Execute the load command.
pub fn execute_load<L, E>(
    args: LoadArgs,
    workspace: &mut Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let use_cache = workspace.rag().config().use_cache && !args.no_cache;
    let report = workspace.load_with(&args.file, use_cache)?;
    println!("{}", formatter.format_load(&report)?);
    Ok(())
}

/// Execute the save command for the loaded contract.
pub fn execute_save<L, E>(workspace: &Workspace<L, E>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let path = workspace.save_index()?;
    println!(
        "{}",
        formatter.success(&format!("Index saved to {}", path.display()))
    );
    Ok(())
}
