//! User command implementation.

use crate::cli::{UserAction, UserArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::fs;
use std::path::Path;

/// Execute the user command, saving any change to `config_path`.
pub fn execute_user(
    args: UserArgs,
    config: &mut Config,
    config_path: &Path,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        UserAction::Show => show_user(config, formatter),
        UserAction::List => list_users(config, formatter),
        UserAction::Switch { name } => switch_user(config, config_path, name, formatter),
    }
}

/// Show the active user.
fn show_user(config: &Config, formatter: &Formatter) -> Result<()> {
    let paths = config.user_paths()?;
    println!("Active user: {}", formatter.success(&config.active_user));
    println!("  Data: {}", paths.root.display());
    Ok(())
}

/// List users that have a data directory.
fn list_users(config: &Config, formatter: &Formatter) -> Result<()> {
    let users = user_names(&config.data_root()?)?;
    if users.is_empty() {
        println!("{}", formatter.info("No users have data yet"));
        return Ok(());
    }

    for name in users {
        if name == config.active_user {
            println!("* {}", formatter.success(&name));
        } else {
            println!("  {}", name);
        }
    }
    Ok(())
}

/// Switch to a different user.
fn switch_user(
    config: &mut Config,
    config_path: &Path,
    name: String,
    formatter: &Formatter,
) -> Result<()> {
    config.switch_user(name.clone())?;
    config.save_to(config_path)?;
    println!(
        "{}",
        formatter.success(&format!("Switched to user '{}'", name))
    );
    Ok(())
}

fn user_names(data_root: &Path) -> Result<Vec<String>> {
    if !data_root.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(data_root)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use tempfile::TempDir;

    #[test]
    fn test_switch_user_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        let formatter = Formatter::new(OutputFormat::Table, false);

        switch_user(&mut config, &path, "alice".to_string(), &formatter).unwrap();
        assert_eq!(config.active_user, "alice");
        assert_eq!(Config::load_from(&path).unwrap().active_user, "alice");
    }

    #[test]
    fn test_user_names_sorted_dirs_only() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("bob")).unwrap();
        fs::create_dir(dir.path().join("alice")).unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(user_names(dir.path()).unwrap(), vec!["alice", "bob"]);
        assert!(user_names(&dir.path().join("missing")).unwrap().is_empty());
    }
}
