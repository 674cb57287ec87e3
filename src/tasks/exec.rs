// src/tasks/exec.rs

use crate::core::{attributes::Attributes, events::LogLevel, project::TaskContext, registry::Task};
use crate::system::executor::{self, OutputMode};
use anyhow::{Result, bail};
use std::collections::HashMap;

/// Runs an external command.
///
/// `env.<NAME>` attributes add environment variables for the child process.
#[derive(Debug)]
pub struct Exec {
    command: String,
    dir: Option<String>,
    fail_on_error: bool,
    output_property: Option<String>,
    result_property: Option<String>,
    env: HashMap<String, String>,
}

impl Default for Exec {
    fn default() -> Self {
        Self {
            command: String::new(),
            dir: None,
            fail_on_error: true,
            output_property: None,
            result_property: None,
            env: HashMap::new(),
        }
    }
}

impl Task for Exec {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known(
            "exec",
            &["command", "dir", "failonerror", "outputproperty", "resultproperty", "env."],
        )?;
        self.command = attributes.required("command")?.to_string();
        self.dir = attributes.get("dir").map(str::to_string);
        self.fail_on_error = attributes.get_bool("failonerror", true)?;
        self.output_property = attributes.get("outputproperty").map(str::to_string);
        self.result_property = attributes.get("resultproperty").map(str::to_string);
        self.env = attributes
            .with_prefix("env.")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let cwd = match &self.dir {
            Some(dir) => ctx.project().resolve_file(dir),
            None => ctx.project().basedir().to_path_buf(),
        };
        let mode = if self.output_property.is_some() {
            OutputMode::Capture
        } else {
            OutputMode::Inherit
        };
        ctx.log(&format!("Executing '{}'", self.command), LogLevel::Verbose);
        let outcome = executor::execute_command(&self.command, &cwd, &self.env, mode)?;

        if let Some(name) = &self.result_property {
            ctx.project_mut().set_property(name, &outcome.code.to_string());
        }
        if let (Some(name), Some(stdout)) = (&self.output_property, &outcome.stdout) {
            ctx.project_mut().set_property(name, stdout.trim_end());
        }
        if !outcome.success() {
            if self.fail_on_error {
                bail!("Command '{}' exited with code {}.", self.command, outcome.code);
            }
            ctx.log(&format!("Result: {}", outcome.code), LogLevel::Error);
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use crate::core::{attributes::Attributes, error::BuildError, events::LogLevel};
    use crate::tasks::test_support::{project_with_log, run_single};

    #[test]
    fn test_exec_captures_output_in_basedir() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "").unwrap();
        let (mut project, _) = project_with_log(LogLevel::Info);
        project.set_basedir(dir.path().to_path_buf());

        // --- Execute ---
        run_single(
            &mut project,
            "exec",
            Attributes::new()
                .with("command", "ls")
                .with("outputproperty", "listing")
                .with("resultproperty", "rc"),
        )
        .unwrap();

        // --- Assert ---
        assert_eq!(project.property("listing"), Some("marker.txt"));
        assert_eq!(project.property("rc"), Some("0"));
    }

    #[test]
    fn test_exec_failonerror() {
        let (mut project, lines) = project_with_log(LogLevel::Error);
        let failing = Attributes::new().with("command", "sh -c 'exit 2'");
        let err = run_single(&mut project, "exec", failing.clone()).unwrap_err();
        assert!(matches!(err, BuildError::TargetExecution { ref task, .. } if task == "exec"));

        run_single(&mut project, "exec", failing.with("failonerror", "false")).unwrap();
        assert!(lines.lock().unwrap().iter().any(|l| l == "Result: 2"));
    }

    #[test]
    fn test_exec_env_attributes() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        run_single(
            &mut project,
            "exec",
            Attributes::new()
                .with("command", "sh -c 'printf %s \"$STAGE\"'")
                .with("env.STAGE", "${stage}")
                .with("outputproperty", "seen"),
        )
        .unwrap();
        assert_eq!(project.property("seen"), Some("${stage}"));
    }
}
