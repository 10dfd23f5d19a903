//! Summarize command implementation.

use crate::error::Result;
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use leasewise_domain::SummaryKind;
use std::fmt::Display;

/// Summarize the loaded contract.
pub async fn execute_summarize<L, E>(
    kind: SummaryKind,
    refresh: bool,
    workspace: &Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let summary = workspace.summarize(kind, refresh).await?;
    println!("{}", formatter.format_summary(&summary)?);
    Ok(())
}
