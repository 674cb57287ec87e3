//! # Command Line Front-end
//!
//! - **`mod.rs`**: the `clap` definition of `anvil [OPTIONS] [TARGETS]...`.
//! - **`runner`**: locates and loads the build file, then either prints help
//!   output or runs the build.
//! - **`console_logger`**: the listener that renders build progress.

use crate::core::events::LogLevel;
use clap::Parser;
use log::LevelFilter;

pub mod console_logger;
pub mod runner;

/// Runs targets from an `anvil.toml` build file.
#[derive(Parser, Debug, Default)]
#[command(
    author,
    version,
    about = t!("cli.about"),
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
pub struct Cli {
    /// Targets to run, in order. Runs the project's default target when empty.
    pub targets: Vec<String>,

    /// Build file to use instead of ./anvil.toml.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<String>,

    /// Sets a user property. May be repeated.
    #[arg(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define)]
    pub defines: Vec<(String, String)>,

    /// Loads user properties from a .properties file. `-D` values win.
    #[arg(long = "propertyfile", value_name = "FILE")]
    pub property_files: Vec<String>,

    /// Keeps building targets that do not depend on a failed one.
    #[arg(short = 'k', long = "keep-going")]
    pub keep_going: bool,

    /// Prints the project's targets and exits.
    #[arg(short = 'p', long = "projecthelp")]
    pub project_help: bool,

    /// Prints the dependency tree of TARGET and exits.
    #[arg(long, value_name = "TARGET")]
    pub tree: Option<String>,

    /// Only prints warnings, errors and the final status.
    #[arg(short, long, conflicts_with_all = ["verbose", "debug"])]
    pub quiet: bool,

    /// Prints verbose build output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Prints debugging output.
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// The threshold for messages shown by the console logger.
    pub fn message_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else if self.verbose {
            LogLevel::Verbose
        } else if self.quiet {
            LogLevel::Warn
        } else {
            LogLevel::Info
        }
    }

    /// The `env_logger` level forced by `-v`/`-d`. `None` leaves `RUST_LOG` in charge.
    pub fn log_filter(&self) -> Option<LevelFilter> {
        if self.debug {
            Some(LevelFilter::Trace)
        } else if self.verbose {
            Some(LevelFilter::Debug)
        } else {
            None
        }
    }
}

/// Parses a `-D NAME=VALUE` argument. The value may be empty or contain `=`.
fn parse_define(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| t!("cli.error.invalid_define").to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err(t!("cli.error.empty_define_name").to_string());
    }
    Ok((name.to_string(), value.to_string()))
}
