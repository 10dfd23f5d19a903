//! Leasewise CLI library.
//!
//! This library provides the core functionality for the Leasewise command-line interface,
//! including configuration management, per-user workspaces, command execution, and output
//! formatting.

pub mod cli;
pub mod commands;
pub mod config;
pub mod embedder;
pub mod error;
pub mod output;
pub mod repl;
pub mod workspace;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use workspace::{DefaultWorkspace, Workspace};
