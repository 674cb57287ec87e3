// src/system/executor.rs

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command as StdCommand, ExitStatus, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("Command '{0}' could not be executed: {1}")]
    CommandFailed(String, std::io::Error),
    #[error("Command '{command}' produced output that was not valid UTF-8")]
    InvalidUtf8Output {
        command: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

/// How a finished command ended and, when captured, what it printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Exit code. `-1` when the process was ended by a signal.
    pub code: i32,
    /// Captured standard output, if capture was requested.
    pub stdout: Option<String>,
}

impl CommandOutcome {
    /// `true` for a zero exit code.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Where the child's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Straight to the user's terminal.
    Inherit,
    /// Into [`CommandOutcome::stdout`].
    Capture,
}

/// Splits a command line with shell quoting rules.
pub fn split_command_line(command_line: &str) -> Result<Vec<String>, ExecutionError> {
    let trimmed = command_line.trim();
    if trimmed.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    let parts =
        shlex::split(trimmed).ok_or_else(|| ExecutionError::CommandParse(trimmed.to_string()))?;
    if parts.is_empty() {
        return Err(ExecutionError::EmptyCommand);
    }
    Ok(parts)
}

/// Runs `command_line` in `cwd` and waits for it.
///
/// A non-zero exit is not an error here; callers decide from
/// [`CommandOutcome::code`]. Standard error always goes to the terminal.
pub fn execute_command(
    command_line: &str,
    cwd: &Path,
    env_vars: &HashMap<String, String>,
    output: OutputMode,
) -> Result<CommandOutcome, ExecutionError> {
    let parts = split_command_line(command_line)?;
    let Some((program, args)) = parts.split_first() else {
        return Err(ExecutionError::EmptyCommand);
    };
    let clean_cwd = dunce::simplified(cwd);
    let stdout = || match output {
        OutputMode::Inherit => Stdio::inherit(),
        OutputMode::Capture => Stdio::piped(),
    };

    log::debug!("Executing '{}' in '{}'", command_line.trim(), clean_cwd.display());
    let result = StdCommand::new(program)
        .args(args)
        .current_dir(clean_cwd)
        .envs(env_vars)
        .stdin(Stdio::null())
        .stdout(stdout())
        .stderr(Stdio::inherit())
        .output();

    // Shell built-ins such as `echo` or `dir` only exist inside cmd.exe.
    let result = match result {
        Err(e) if e.kind() == ErrorKind::NotFound && cfg!(target_os = "windows") => {
            log::debug!("Command '{}' not found. Retrying with cmd /C.", program);
            StdCommand::new("cmd")
                .arg("/C")
                .arg(command_line.trim())
                .current_dir(clean_cwd)
                .envs(env_vars)
                .stdin(Stdio::null())
                .stdout(stdout())
                .stderr(Stdio::inherit())
                .output()
        }
        other => other,
    };
    let finished =
        result.map_err(|e| ExecutionError::CommandFailed(command_line.trim().to_string(), e))?;

    let stdout = match output {
        OutputMode::Inherit => None,
        OutputMode::Capture => Some(String::from_utf8(finished.stdout).map_err(|e| {
            ExecutionError::InvalidUtf8Output {
                command: command_line.trim().to_string(),
                source: e,
            }
        })?),
    };
    Ok(CommandOutcome {
        code: exit_code(finished.status),
        stdout,
    })
}

fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
