// src/bin/anvil.rs

use anvil::cli::{Cli, runner};
use anvil::core::events::BUILD_LOG_TARGET;
use clap::Parser;
use colored::*;
use log::LevelFilter;

/// Entry point: sets up logging, runs the build, maps the outcome to an exit code.
fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    log::debug!("CLI args parsed: {:?}", cli);

    if let Err(e) = runner::run(&cli) {
        eprintln!("\n{}: {:#}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Warnings by default, `RUST_LOG` on top, `-v`/`-d` on top of that.
///
/// Project messages are already printed by the console logger, so their
/// mirror in the `log` facade stays off unless `RUST_LOG` names it.
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(LevelFilter::Warn)
        .filter_module(BUILD_LOG_TARGET, LevelFilter::Off)
        .parse_default_env();
    if let Some(level) = cli.log_filter() {
        builder.filter_level(level);
    }
    builder.init();
}
