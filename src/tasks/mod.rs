//! # Built-in Tasks
//!
//! The tasks every project knows after [`Project::init`](crate::core::project::Project::init).
//! `mkdir` and `sleep` need nothing from the build and are written as
//! [`Executable`](crate::core::registry::Executable)s; the others are full tasks.

pub mod call;
pub mod echo;
pub mod exec;
pub mod fail;
pub mod mkdir;
pub mod property;
pub mod sleep;

use crate::core::registry::{
    ComponentRegistry, data_type_factory, executable_factory, task_factory,
};
use crate::types::path::PathList;

/// Registers the built-in task and data-type definitions.
pub fn register_builtins(registry: &mut ComponentRegistry) {
    registry.add_task_definition("echo", task_factory::<echo::Echo>());
    registry.add_task_definition("property", task_factory::<property::PropertyTask>());
    registry.add_task_definition("fail", task_factory::<fail::Fail>());
    registry.add_task_definition("exec", task_factory::<exec::Exec>());
    registry.add_task_definition("call", task_factory::<call::Call>());
    registry.add_task_definition("mkdir", executable_factory::<mkdir::Mkdir>());
    registry.add_task_definition("sleep", executable_factory::<sleep::Sleep>());

    registry.add_data_type_definition("path", data_type_factory::<PathList>());
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::core::{
        attributes::Attributes,
        error::BuildResult,
        events::{BuildEvent, BuildListener, LogLevel},
        project::Project,
        target::{Target, TaskInvocation},
    };
    use std::sync::{Arc, Mutex};

    /// Collects logged messages at or above a level.
    pub struct Collector {
        pub threshold: LogLevel,
        pub lines: Arc<Mutex<Vec<String>>>,
    }

    impl BuildListener for Collector {
        fn message_logged(&mut self, event: &BuildEvent<'_>) {
            if let (Some(message), Some(priority)) = (event.message, event.priority) {
                if priority <= self.threshold {
                    self.lines.lock().unwrap().push(message.to_string());
                }
            }
        }
    }

    /// An initialized project whose messages up to `threshold` are collected.
    pub fn project_with_log(threshold: LogLevel) -> (Project, Arc<Mutex<Vec<String>>>) {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut project = Project::new();
        project.init();
        project.set_name("fixture");
        project.add_build_listener(Box::new(Collector {
            threshold,
            lines: lines.clone(),
        }));
        (project, lines)
    }

    /// Adds a target holding a single task call and runs it.
    pub fn run_single(project: &mut Project, task: &str, attributes: Attributes) -> BuildResult<()> {
        let name = format!("run-{}", task);
        project.add_or_replace_target(
            Target::new(name.clone()).with_task(TaskInvocation::new(task, attributes)),
        );
        project.execute_target(&name)
    }
}
