// src/cli/runner.rs

use crate::cli::{Cli, console_logger::ConsoleLogger};
use crate::constants::DEFAULT_BUILD_FILENAME;
use crate::core::{
    events::LogLevel,
    graph_display,
    loader::{self, LoadOptions},
    paths,
};
use anyhow::{Result, bail};
use std::path::PathBuf;

/// Executes one `anvil` invocation.
pub fn run(cli: &Cli) -> Result<()> {
    let build_file = locate_build_file(cli.file.as_deref())?;
    let options = LoadOptions {
        user_properties: cli.defines.clone(),
        property_files: cli
            .property_files
            .iter()
            .map(|f| paths::expand_path(f))
            .collect::<Result<_>>()?,
        load_user_defaults: true,
        keep_going: cli.keep_going,
    };
    let mut project = loader::load_project(&build_file, &options)?;

    if cli.project_help {
        print!("{}", graph_display::render_project_help(&project));
        return Ok(());
    }
    if let Some(root) = &cli.tree {
        print!("{}", graph_display::render_target_tree(&project, root)?);
        return Ok(());
    }

    let level = cli.message_level();
    if level >= LogLevel::Info {
        println!("{} {}", t!("cli.buildfile"), build_file.display());
    }
    project.add_build_listener(Box::new(ConsoleLogger::stdout(level)));
    project.run_build(&cli.targets)?;
    Ok(())
}

/// `-f FILE` (with `~` and `$VAR` expanded) or `./anvil.toml`.
fn locate_build_file(file: Option<&str>) -> Result<PathBuf> {
    let path = match file {
        Some(file) => paths::expand_path(file)?,
        None => PathBuf::from(DEFAULT_BUILD_FILENAME),
    };
    if !path.is_file() {
        bail!("{} {}", t!("cli.error.build_file_not_found"), path.display());
    }
    Ok(path)
}
