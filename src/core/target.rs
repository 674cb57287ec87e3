// src/core/target.rs

use crate::core::{attributes::Attributes, error::BuildResult, properties::PropertyTable};

/// One configured call of a task inside a target.
///
/// Attribute values are stored raw and expanded right before the task runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInvocation {
    /// Registered task name.
    pub task: String,
    /// Raw attribute values.
    pub attributes: Attributes,
}

impl TaskInvocation {
    /// Creates an invocation of `task` with `attributes`.
    pub fn new(task: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            task: task.into(),
            attributes,
        }
    }
}

/// A named unit of work with dependencies and an optional guard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    name: String,
    depends: Vec<String>,
    description: Option<String>,
    if_condition: Option<String>,
    unless_condition: Option<String>,
    tasks: Vec<TaskInvocation>,
}

impl Target {
    /// Creates an empty target.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Appends a dependency, builder style.
    pub fn depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends.push(name.into());
        self
    }

    /// Sets the description, builder style. A described target is a "main" target.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Runs the target only if this property is set.
    pub fn with_if(mut self, property: impl Into<String>) -> Self {
        self.if_condition = Some(property.into());
        self
    }

    /// Skips the target if this property is set.
    pub fn with_unless(mut self, property: impl Into<String>) -> Self {
        self.unless_condition = Some(property.into());
        self
    }

    /// Appends a task invocation, builder style.
    pub fn with_task(mut self, invocation: TaskInvocation) -> Self {
        self.tasks.push(invocation);
        self
    }

    /// Appends a task invocation.
    pub fn add_task(&mut self, invocation: TaskInvocation) {
        self.tasks.push(invocation);
    }

    /// Appends a dependency.
    pub fn add_dependency(&mut self, name: impl Into<String>) {
        self.depends.push(name.into());
    }

    /// The target's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependency names in declaration order.
    pub fn dependencies(&self) -> &[String] {
        &self.depends
    }

    /// The description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// `true` when the target has a description and is meant to be called directly.
    pub fn is_main(&self) -> bool {
        self.description.is_some()
    }

    /// The task invocations in order.
    pub fn tasks(&self) -> &[TaskInvocation] {
        &self.tasks
    }

    /// The `if` guard property name, unexpanded.
    pub fn if_condition(&self) -> Option<&str> {
        self.if_condition.as_deref()
    }

    /// The `unless` guard property name, unexpanded.
    pub fn unless_condition(&self) -> Option<&str> {
        self.unless_condition.as_deref()
    }

    /// Evaluates the guard. Returns `Ok(None)` if the target should run, or the
    /// reason it is skipped.
    pub fn skip_reason(&self, properties: &PropertyTable) -> BuildResult<Option<String>> {
        if let Some(raw) = &self.if_condition {
            let name = properties.replace_properties(raw)?;
            if !properties.contains(&name) {
                return Ok(Some(format!(
                    "Skipped because property '{}' not set.",
                    name
                )));
            }
        }
        if let Some(raw) = &self.unless_condition {
            let name = properties.replace_properties(raw)?;
            if properties.contains(&name) {
                return Ok(Some(format!("Skipped because property '{}' set.", name)));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::properties::PropertyTier;

    #[test]
    fn test_builder_and_main_flag() {
        let target = Target::new("build")
            .depends_on("compile")
            .depends_on("resources")
            .with_description("Builds everything")
            .with_task(TaskInvocation::new("echo", Attributes::new().with("message", "hi")));
        assert_eq!(target.name(), "build");
        assert_eq!(target.dependencies(), ["compile", "resources"]);
        assert!(target.is_main());
        assert!(!Target::new("internal").is_main());
        assert_eq!(target.tasks().len(), 1);
    }

    #[test]
    fn test_if_guard() {
        let mut props = PropertyTable::new();
        let target = Target::new("t").with_if("do.it");
        assert!(target.skip_reason(&props).unwrap().is_some());
        props.set_property("do.it", "", PropertyTier::Plain, false);
        assert!(target.skip_reason(&props).unwrap().is_none());
    }

    #[test]
    fn test_unless_guard_with_expanded_name() {
        let mut props = PropertyTable::new();
        props.set_property("mode", "fast", PropertyTier::Plain, false);
        let target = Target::new("t").with_unless("skip.${mode}");
        assert!(target.skip_reason(&props).unwrap().is_none());
        props.set_property("skip.fast", "true", PropertyTier::User, false);
        let reason = target.skip_reason(&props).unwrap().unwrap();
        assert!(reason.contains("skip.fast"));
    }
}
