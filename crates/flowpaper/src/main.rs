mod bindings;
mod cli;
mod paths;
mod run;

use std::fs;

use anyhow::{bail, Context, Result};
use cli::{Command, ConfigAction};
use flowconfig::DEFAULT_CONFIG;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Config(config_cmd)) => {
            let paths = AppPaths::discover(cli.run.config.as_deref())?;
            handle_config_command(&paths, config_cmd.action)
        }
        None => run::run(cli.run),
    }
}

fn handle_config_command(paths: &AppPaths, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Where => {
            println!("{}", paths.config_file().display());
            Ok(())
        }
        ConfigAction::Init { force } => run_config_init(paths, force),
        ConfigAction::Show => {
            let config = run::load_config(paths)?;
            let source = if paths.config_file().exists() {
                paths.config_file().display().to_string()
            } else {
                "(built-in defaults)".to_string()
            };
            println!("# source: {source}");
            println!("{config:#?}");
            Ok(())
        }
    }
}

fn run_config_init(paths: &AppPaths, force: bool) -> Result<()> {
    let target = paths.config_file();
    if target.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite",
            target.display()
        );
    }
    fs::create_dir_all(paths.config_dir()).with_context(|| {
        format!(
            "failed to create config directory at {}",
            paths.config_dir().display()
        )
    })?;
    fs::write(target, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write {}", target.display()))?;
    println!("Wrote default configuration to {}", target.display());
    Ok(())
}
