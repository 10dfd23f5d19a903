//! Stats and history command implementations.

use crate::error::Result;
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use std::fmt::Display;

/// Print session statistics.
pub fn execute_stats<L, E>(workspace: &Workspace<L, E>, formatter: &Formatter) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    println!("{}", formatter.format_stats(&workspace.statistics())?);
    Ok(())
}

/// Print stored questions and answers for the loaded contract.
pub fn execute_history<L, E>(
    limit: usize,
    workspace: &Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let records = workspace.history(limit)?;
    println!("{}", formatter.format_history(&records)?);
    Ok(())
}
