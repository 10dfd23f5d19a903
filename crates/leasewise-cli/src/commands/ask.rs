//! Ask command implementation.

use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::workspace::Workspace;
use leasewise_domain::traits::{EmbeddingModel, LlmProvider};
use std::fmt::Display;

/// Ask `question` about the loaded contract and print the answer.
pub async fn execute_ask<L, E>(
    question: &str,
    workspace: &mut Workspace<L, E>,
    formatter: &Formatter,
) -> Result<()>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
    E: EmbeddingModel,
    E::Error: Display,
{
    let question = question.trim();
    if question.is_empty() {
        return Err(CliError::InvalidInput("Question cannot be empty".to_string()));
    }

    let answer = workspace.ask(question).await?;
    if answer.is_no_contract() {
        println!("{}", formatter.warning(&answer.answer));
    } else {
        println!("{}", formatter.format_answer(&answer)?);
    }
    Ok(())
}
