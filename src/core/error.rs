// src/core/error.rs

use thiserror::Error;

/// Represents every failure the build engine can report.
///
/// Resolution errors (`UnknownTarget`, `CircularDependency`) are raised before
/// any task runs. Execution errors carry the originating cause so the whole
/// chain is visible through `std::error::Error::source`.
#[derive(Error, Debug)]
pub enum BuildError {
    /// A target name was requested or referenced as a dependency but never declared.
    #[error("{}", unknown_target_message(.name, .parent.as_deref()))]
    UnknownTarget {
        /// The missing target.
        name: String,
        /// The target whose `depends` list referenced the missing one, if any.
        parent: Option<String>,
    },
    /// A dependency chain revisits a target that is still being visited.
    #[error("Circular dependency: {}", .path.join(" -> "))]
    CircularDependency {
        /// The full cycle, starting and ending with the same target.
        path: Vec<String>,
    },
    /// A target with the same name is already part of the project.
    #[error("Duplicate target '{name}'.")]
    DuplicateTarget {
        /// The name that was added twice.
        name: String,
    },
    /// No targets were requested and the project has no target to fall back on.
    #[error("No target specified and project '{project}' has no default target.")]
    NoDefaultTarget {
        /// The project name.
        project: String,
    },
    /// No task or data type is registered under the requested name.
    #[error("Could not create {kind} '{name}': no such definition is registered.")]
    UnknownComponent {
        /// `"task"` or `"type"`.
        kind: &'static str,
        /// The requested name.
        name: String,
    },
    /// A registered factory failed to build its component.
    #[error("Could not create {kind} '{name}': {source}")]
    ComponentCreation {
        /// `"task"` or `"type"`.
        kind: &'static str,
        /// The requested name.
        name: String,
        /// The failure reported by the factory.
        #[source]
        source: anyhow::Error,
    },
    /// An object was found but lacks the capability the caller asked for.
    #[error("'{name}' is not a {expected}.")]
    TypeMismatch {
        /// The component name or reference id.
        name: String,
        /// The capability that was expected.
        expected: &'static str,
    },
    /// A `${` was opened but never closed.
    #[error("Syntax error in property: '{text}' has an unclosed '${{'.")]
    UnclosedPropertyToken {
        /// The offending text.
        text: String,
    },
    /// Properties loaded from one file reference each other in a loop.
    #[error("Property '{name}' was circularly defined.")]
    CircularProperty {
        /// The property that closed the loop.
        name: String,
    },
    /// A task explicitly failed the build (e.g. the `fail` task).
    #[error("{message}")]
    TaskFailed {
        /// The message supplied by the task.
        message: String,
    },
    /// A task within a target failed with an error the engine did not recognize.
    #[error("Target '{target}' failed in task '{task}': {source:#}")]
    TargetExecution {
        /// The target being executed.
        target: String,
        /// The task that failed.
        task: String,
        /// The originating error.
        #[source]
        source: anyhow::Error,
    },
    /// A build file could not be parsed.
    #[error("Failed to parse build file '{path}': {source}")]
    BuildFileParse {
        /// The path of the build file.
        path: std::path::PathBuf,
        /// The underlying error from the `toml` crate.
        #[source]
        source: toml::de::Error,
    },
    /// A declaration in a build file was rejected while setting up the project.
    #[error("Invalid {context}: {source:#}")]
    Declaration {
        /// What was being declared, e.g. `[[property]] #2`.
        context: String,
        /// Why it was rejected.
        #[source]
        source: anyhow::Error,
    },
    /// The engine reached a state its own bookkeeping rules out.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the broken invariant.
        message: String,
    },
    /// A filesystem operation failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// The file or directory involved.
        path: std::path::PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
}

fn unknown_target_message(name: &str, parent: Option<&str>) -> String {
    match parent {
        Some(parent) => format!(
            "Target '{}' does not exist in the project. It is used from target '{}'.",
            name, parent
        ),
        None => format!("Target '{}' does not exist in the project.", name),
    }
}

/// Shorthand result type for engine operations.
pub type BuildResult<T> = Result<T, BuildError>;

impl BuildError {
    /// Builds an I/O error bound to a path.
    pub fn io(path: impl Into<std::path::PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns `true` for errors raised while ordering targets, which are never
    /// subject to keep-going.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownTarget { .. } | Self::CircularDependency { .. }
        )
    }
}
