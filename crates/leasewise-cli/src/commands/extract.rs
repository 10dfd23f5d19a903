//! Extract command implementation.

use crate::error::Result;
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use std::fmt::Display;

/// Extract the structured record of the loaded contract.
pub async fn execute_extract<L, E>(
    parallel: bool,
    refresh: bool,
    workspace: &mut Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let extraction = workspace.extract(parallel, refresh).await?;
    println!("{}", formatter.format_extraction(&extraction)?);
    Ok(())
}
