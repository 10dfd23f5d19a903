//! Leasewise CLI - question answering over rental contracts.

use anyhow::Context;
use clap::Parser;
use leasewise_cli::commands;
use leasewise_cli::repl;
use leasewise_cli::{Cli, Command, Config, DefaultWorkspace, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("LEASEWISE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    // Log to stderr so stdout stays parseable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

fn open_workspace(config: &Config) -> anyhow::Result<DefaultWorkspace> {
    DefaultWorkspace::from_config(config)
        .with_context(|| format!("Failed to open workspace for user '{}'", config.active_user))
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let mut config = Config::load_from(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    if let Some(user) = cli.user {
        config.switch_user(user)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let history_size = config.settings.history_size;
    match cli.command {
        Some(Command::User(args)) => {
            commands::execute_user(args, &mut config, &config_path, &formatter)?;
        }
        None => {
            let mut workspace = open_workspace(&config)?;
            repl::run_repl(&mut workspace, &formatter, history_size, None).await?;
        }
        Some(Command::Repl(args)) => {
            let mut workspace = open_workspace(&config)?;
            repl::run_repl(&mut workspace, &formatter, history_size, args.file).await?;
        }
        Some(Command::Load(args)) => {
            let mut workspace = open_workspace(&config)?;
            commands::execute_load(args, &mut workspace, &formatter)?;
        }
        Some(Command::Ask(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_ask(&args.question(), &mut workspace, &formatter).await?;
        }
        Some(Command::Summarize(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_summarize(args.kind.into(), args.refresh, &workspace, &formatter)
                .await?;
        }
        Some(Command::Extract(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_extract(args.parallel, args.refresh, &mut workspace, &formatter)
                .await?;
        }
        Some(Command::Stats(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_stats(&workspace, &formatter)?;
        }
        Some(Command::History(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_history(args.limit, &workspace, &formatter)?;
        }
        Some(Command::Save(args)) => {
            let mut workspace = open_workspace(&config)?;
            workspace.load(&args.file)?;
            commands::execute_save(&workspace, &formatter)?;
        }
    }

    Ok(())
}
