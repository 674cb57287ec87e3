// src/tasks/echo.rs

use crate::core::{attributes::Attributes, events::LogLevel, project::TaskContext, registry::Task};
use anyhow::{Result, anyhow};

/// Logs a message through the project.
#[derive(Debug)]
pub struct Echo {
    message: String,
    level: LogLevel,
}

impl Default for Echo {
    fn default() -> Self {
        Self {
            message: String::new(),
            level: LogLevel::Info,
        }
    }
}

impl Task for Echo {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known("echo", &["message", "level"])?;
        self.message = attributes.get("message").unwrap_or_default().to_string();
        if let Some(raw) = attributes.get("level") {
            self.level =
                LogLevel::parse(raw).ok_or_else(|| anyhow!("Unknown echo level '{}'.", raw))?;
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        ctx.log(&self.message, self.level);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{attributes::Attributes, error::BuildError, events::LogLevel};
    use crate::tasks::test_support::{project_with_log, run_single};

    #[test]
    fn test_echo_expands_properties() {
        // --- Setup ---
        let (mut project, lines) = project_with_log(LogLevel::Info);
        project.set_user_property("user.name", "Ada");

        // --- Execute ---
        run_single(
            &mut project,
            "echo",
            Attributes::new().with("message", "Hello, ${user.name}!"),
        )
        .unwrap();

        // --- Assert ---
        assert_eq!(*lines.lock().unwrap(), vec!["Hello, Ada!"]);
    }

    #[test]
    fn test_echo_level_filters_and_validation() {
        let (mut project, lines) = project_with_log(LogLevel::Info);
        run_single(
            &mut project,
            "echo",
            Attributes::new().with("message", "quiet").with("level", "debug"),
        )
        .unwrap();
        assert!(lines.lock().unwrap().is_empty());

        let err = run_single(&mut project, "echo", Attributes::new().with("level", "loud"))
            .unwrap_err();
        assert!(matches!(err, BuildError::TargetExecution { ref task, .. } if task == "echo"));
    }
}
