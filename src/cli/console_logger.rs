// src/cli/console_logger.rs

use crate::core::events::{BuildEvent, BuildListener, EventSubject, LogLevel};
use colored::*;
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

/// Prints build progress to a terminal.
///
/// Messages above `threshold` are dropped. Target headers are INFO messages,
/// so they disappear in quiet mode; the final status line is always printed.
pub struct ConsoleLogger {
    threshold: LogLevel,
    out: Box<dyn Write + Send>,
    started: Option<Instant>,
}

impl fmt::Debug for ConsoleLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleLogger")
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl ConsoleLogger {
    /// A logger writing to standard output.
    pub fn stdout(threshold: LogLevel) -> Self {
        Self::with_writer(threshold, Box::new(io::stdout()))
    }

    /// A logger writing to `out`.
    pub fn with_writer(threshold: LogLevel, out: Box<dyn Write + Send>) -> Self {
        Self {
            threshold,
            out,
            started: None,
        }
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{}", line) {
            log::debug!("Console write failed: {}", e);
        }
    }
}

fn paint(text: &str, level: LogLevel) -> String {
    match level {
        LogLevel::Error => text.red().to_string(),
        LogLevel::Warn => text.yellow().to_string(),
        LogLevel::Info => text.to_string(),
        LogLevel::Verbose | LogLevel::Debug => text.dimmed().to_string(),
    }
}

impl BuildListener for ConsoleLogger {
    fn build_started(&mut self, _event: &BuildEvent<'_>) {
        self.started = Some(Instant::now());
    }

    fn build_finished(&mut self, event: &BuildEvent<'_>) {
        let status = match event.error {
            None => t!("build.successful").green().bold(),
            Some(_) => t!("build.failed").red().bold(),
        };
        self.emit(&format!("\n{}", status));
        if let Some(started) = self.started {
            let line = format!("{} {:.2?}", t!("build.total_time"), started.elapsed());
            self.emit(&line);
        }
    }

    fn target_started(&mut self, event: &BuildEvent<'_>) {
        if self.threshold < LogLevel::Info {
            return;
        }
        if let EventSubject::Target { target } = event.subject {
            let header = format!("\n{}:", target.bold());
            self.emit(&header);
        }
    }

    fn message_logged(&mut self, event: &BuildEvent<'_>) {
        let (Some(message), Some(priority)) = (event.message, event.priority) else {
            return;
        };
        if priority > self.threshold {
            return;
        }
        let line = match event.subject {
            EventSubject::Task { task, .. } => {
                format!("{:>12} {}", format!("[{}]", task).cyan(), paint(message, priority))
            }
            _ => paint(message, priority),
        };
        self.emit(&line);
    }
}
