// src/tasks/fail.rs

use crate::core::{
    attributes::Attributes, error::BuildError, project::TaskContext, registry::Task,
};
use anyhow::Result;

/// Stops the build with a message, optionally only when a property is (not) set.
#[derive(Debug, Default)]
pub struct Fail {
    message: Option<String>,
    if_property: Option<String>,
    unless_property: Option<String>,
}

impl Task for Fail {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known("fail", &["message", "if", "unless"])?;
        self.message = attributes.get("message").map(str::to_string);
        self.if_property = attributes.get("if").map(str::to_string);
        self.unless_property = attributes.get("unless").map(str::to_string);
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let properties = ctx.project().properties();
        if let Some(name) = &self.if_property {
            if !properties.contains(name) {
                return Ok(());
            }
        }
        if let Some(name) = &self.unless_property {
            if properties.contains(name) {
                return Ok(());
            }
        }
        Err(BuildError::TaskFailed {
            message: self
                .message
                .clone()
                .unwrap_or_else(|| "No message".to_string()),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{attributes::Attributes, error::BuildError, events::LogLevel};
    use crate::tasks::test_support::{project_with_log, run_single};

    #[test]
    fn test_fail_raises_task_failed() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        let err = run_single(&mut project, "fail", Attributes::new().with("message", "stop"))
            .unwrap_err();
        assert!(matches!(err, BuildError::TaskFailed { ref message } if message == "stop"));
    }

    #[test]
    fn test_fail_conditions() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        let guarded = Attributes::new().with("if", "broken");
        assert!(run_single(&mut project, "fail", guarded.clone()).is_ok());
        project.set_property("broken", "yes");
        assert!(run_single(&mut project, "fail", guarded).is_err());

        let unless = Attributes::new().with("unless", "broken");
        assert!(run_single(&mut project, "fail", unless).is_ok());
    }
}
