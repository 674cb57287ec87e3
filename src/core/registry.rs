//! # Component Registry
//!
//! Maps task and data-type names to factories. Names are matched without regard
//! to case and the first definition of a name wins. Factories are plain function
//! values registered up front, so creating a component never involves looking a
//! type up by its string name at runtime.
//!
//! A factory may produce a full [`Task`], a plain [`Executable`] that knows
//! nothing about the build (wrapped in a [`TaskAdapter`] on creation), or a
//! [`DataType`].

use crate::core::{
    attributes::Attributes,
    error::{BuildError, BuildResult},
    project::{Project, TaskContext},
};
use anyhow::Result;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A unit of build work invoked by name from a target.
pub trait Task {
    /// Receives the invocation's attributes, already property-expanded.
    fn configure(&mut self, attributes: &Attributes) -> Result<()>;

    /// Performs the work.
    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()>;
}

/// A task-like object that needs no access to the build.
///
/// It is reached through [`TaskAdapter`], which forwards `configure` and
/// turns `execute` into a call to [`Executable::run`].
pub trait Executable {
    /// Receives the invocation's attributes.
    fn configure(&mut self, attributes: &Attributes) -> Result<()>;

    /// Performs the work.
    fn run(&mut self) -> Result<()>;
}

/// A configurable value that can be stored as a reference.
pub trait DataType: Any + Send + Sync + fmt::Debug {
    /// Receives the declaration's attributes; `project` supplies `basedir` and properties.
    fn configure(&mut self, attributes: &Attributes, project: &Project) -> Result<()>;

    /// Renders the value as a property string (used by `property refid=...`).
    fn to_property_string(&self) -> String;

    /// Converts the boxed value into a shareable, type-erased handle.
    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Wraps an [`Executable`] so the engine can drive it as a [`Task`].
pub struct TaskAdapter {
    inner: Box<dyn Executable>,
}

impl TaskAdapter {
    /// Wraps `inner`.
    pub fn new(inner: Box<dyn Executable>) -> Self {
        Self { inner }
    }
}

impl fmt::Debug for TaskAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskAdapter").finish_non_exhaustive()
    }
}

impl Task for TaskAdapter {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        self.inner.configure(attributes)
    }

    fn execute(&mut self, _ctx: &mut TaskContext<'_>) -> Result<()> {
        self.inner.run()
    }
}

/// What a factory produces.
pub enum Component {
    /// A full task.
    Task(Box<dyn Task>),
    /// A task-like object that will be adapted.
    Executable(Box<dyn Executable>),
    /// A data type.
    DataType(Box<dyn DataType>),
}

impl Component {
    fn capability(&self) -> &'static str {
        match self {
            Self::Task(_) => "task",
            Self::Executable(_) => "executable",
            Self::DataType(_) => "data type",
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component::{}", self.capability())
    }
}

/// A shareable constructor for components.
pub type ComponentFactory = Arc<dyn Fn() -> Result<Component> + Send + Sync>;

/// Factory for a [`Task`] type with a `Default` constructor.
pub fn task_factory<T: Task + Default + 'static>() -> ComponentFactory {
    Arc::new(|| Ok(Component::Task(Box::new(T::default()))))
}

/// Factory for an [`Executable`] type with a `Default` constructor.
pub fn executable_factory<T: Executable + Default + 'static>() -> ComponentFactory {
    Arc::new(|| Ok(Component::Executable(Box::new(T::default()))))
}

/// Factory for a [`DataType`] with a `Default` constructor.
pub fn data_type_factory<T: DataType + Default + 'static>() -> ComponentFactory {
    Arc::new(|| Ok(Component::DataType(Box::new(T::default()))))
}

#[derive(Clone)]
struct Definition {
    name: String,
    factory: ComponentFactory,
}

/// The two namespaces of component definitions.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    tasks: HashMap<String, Definition>,
    types: HashMap<String, Definition>,
}

impl fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("tasks", &self.task_names())
            .field("types", &self.data_type_names())
            .finish()
    }
}

const TASK_KIND: &str = "task";
const TYPE_KIND: &str = "type";

impl ComponentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a task factory. Returns `false` (and changes nothing) if the
    /// name is already taken.
    pub fn add_task_definition(&mut self, name: &str, factory: ComponentFactory) -> bool {
        add_definition(&mut self.tasks, TASK_KIND, name, factory)
    }

    /// Registers a data-type factory. Returns `false` if the name is already taken.
    pub fn add_data_type_definition(&mut self, name: &str, factory: ComponentFactory) -> bool {
        add_definition(&mut self.types, TYPE_KIND, name, factory)
    }

    /// Registers `alias` as another name for the existing task `existing`.
    pub fn alias_task(&mut self, alias: &str, existing: &str) -> BuildResult<bool> {
        let factory = self
            .tasks
            .get(&existing.to_lowercase())
            .map(|d| d.factory.clone())
            .ok_or_else(|| BuildError::UnknownComponent {
                kind: TASK_KIND,
                name: existing.to_string(),
            })?;
        Ok(self.add_task_definition(alias, factory))
    }

    /// Returns `true` if a task named `name` is registered.
    pub fn has_task(&self, name: &str) -> bool {
        self.tasks.contains_key(&name.to_lowercase())
    }

    /// Returns `true` if a data type named `name` is registered.
    pub fn has_data_type(&self, name: &str) -> bool {
        self.types.contains_key(&name.to_lowercase())
    }

    /// Registered task names, as first written, sorted.
    pub fn task_names(&self) -> Vec<String> {
        sorted_names(&self.tasks)
    }

    /// Registered data-type names, as first written, sorted.
    pub fn data_type_names(&self) -> Vec<String> {
        sorted_names(&self.types)
    }

    /// Creates a fresh task instance.
    ///
    /// Returns `Ok(None)` when no task of that name exists so the caller can
    /// decide how to report it. Executables come back wrapped in a [`TaskAdapter`].
    pub fn create_task(&self, name: &str) -> BuildResult<Option<Box<dyn Task>>> {
        let Some(component) = instantiate(&self.tasks, TASK_KIND, name)? else {
            return Ok(None);
        };
        match component {
            Component::Task(task) => Ok(Some(task)),
            Component::Executable(inner) => {
                log::trace!("Adapting executable '{}' as a task", name);
                Ok(Some(Box::new(TaskAdapter::new(inner))))
            }
            Component::DataType(_) => Err(BuildError::TypeMismatch {
                name: name.to_string(),
                expected: "task",
            }),
        }
    }

    /// Creates a fresh data-type instance. `Ok(None)` if the name is unknown.
    pub fn create_data_type(&self, name: &str) -> BuildResult<Option<Box<dyn DataType>>> {
        let Some(component) = instantiate(&self.types, TYPE_KIND, name)? else {
            return Ok(None);
        };
        match component {
            Component::DataType(data_type) => Ok(Some(data_type)),
            other => {
                log::debug!("'{}' produced a {} instead of a data type", name, other.capability());
                Err(BuildError::TypeMismatch {
                    name: name.to_string(),
                    expected: "data type",
                })
            }
        }
    }
}

fn add_definition(
    map: &mut HashMap<String, Definition>,
    kind: &str,
    name: &str,
    factory: ComponentFactory,
) -> bool {
    let key = name.to_lowercase();
    if let Some(existing) = map.get(&key) {
        log::debug!(
            "Ignoring {} definition '{}': '{}' is already defined.",
            kind,
            name,
            existing.name
        );
        return false;
    }
    log::trace!("Adding {} definition '{}'", kind, name);
    map.insert(
        key,
        Definition {
            name: name.to_string(),
            factory,
        },
    );
    true
}

fn instantiate(
    map: &HashMap<String, Definition>,
    kind: &'static str,
    name: &str,
) -> BuildResult<Option<Component>> {
    let Some(definition) = map.get(&name.to_lowercase()) else {
        return Ok(None);
    };
    (definition.factory)()
        .map(Some)
        .map_err(|source| BuildError::ComponentCreation {
            kind,
            name: name.to_string(),
            source,
        })
}

fn sorted_names(map: &HashMap<String, Definition>) -> Vec<String> {
    let mut names: Vec<String> = map.values().map(|d| d.name.clone()).collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static RUNS: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Noop;

    impl Task for Noop {
        fn configure(&mut self, _attributes: &Attributes) -> Result<()> {
            Ok(())
        }
        fn execute(&mut self, _ctx: &mut TaskContext<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Counter;

    impl Executable for Counter {
        fn configure(&mut self, _attributes: &Attributes) -> Result<()> {
            Ok(())
        }
        fn run(&mut self) -> Result<()> {
            RUNS.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Label(String);

    impl DataType for Label {
        fn configure(&mut self, attributes: &Attributes, _project: &Project) -> Result<()> {
            self.0 = attributes.required("text")?.to_string();
            Ok(())
        }
        fn to_property_string(&self) -> String {
            self.0.clone()
        }
        fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync> {
            Arc::new(*self)
        }
    }

    #[test]
    fn test_first_definition_wins_case_insensitively() {
        let mut registry = ComponentRegistry::new();
        assert!(registry.add_task_definition("Echo", task_factory::<Noop>()));
        assert!(!registry.add_task_definition("echo", executable_factory::<Counter>()));
        assert!(registry.has_task("ECHO"));
        assert_eq!(registry.task_names(), vec!["Echo".to_string()]);
    }

    #[test]
    fn test_create_task_unknown_returns_none() {
        let registry = ComponentRegistry::new();
        assert!(registry.create_task("missing").unwrap().is_none());
    }

    #[test]
    fn test_executable_is_adapted_and_runs() {
        let mut registry = ComponentRegistry::new();
        registry.add_task_definition("count", executable_factory::<Counter>());
        let mut task = registry.create_task("count").unwrap().unwrap();
        let mut project = Project::new();
        let before = RUNS.load(Ordering::SeqCst);
        let mut ctx = TaskContext::new(&mut project, "t", "count");
        task.execute(&mut ctx).unwrap();
        assert_eq!(RUNS.load(Ordering::SeqCst), before + 1);
    }

    #[test]
    fn test_factory_failure_is_component_creation_error() {
        let mut registry = ComponentRegistry::new();
        registry.add_task_definition("broken", Arc::new(|| Err(anyhow!("no tool installed"))));
        let err = registry.create_task("broken").err().unwrap();
        assert!(matches!(err, BuildError::ComponentCreation { ref name, .. } if name == "broken"));
        assert!(err.to_string().contains("no tool installed"));
    }

    #[test]
    fn test_data_type_capability_checks() {
        let mut registry = ComponentRegistry::new();
        registry.add_data_type_definition("label", data_type_factory::<Label>());
        registry.add_data_type_definition("notatype", task_factory::<Noop>());
        registry.add_task_definition("label", data_type_factory::<Label>());

        assert!(registry.create_data_type("label").unwrap().is_some());
        assert!(matches!(
            registry.create_data_type("notatype"),
            Err(BuildError::TypeMismatch { expected: "data type", .. })
        ));
        assert!(matches!(
            registry.create_task("label"),
            Err(BuildError::TypeMismatch { expected: "task", .. })
        ));
        assert!(registry.create_data_type("nothing").unwrap().is_none());
    }

    #[test]
    fn test_alias_task() {
        let mut registry = ComponentRegistry::new();
        registry.add_task_definition("echo", task_factory::<Noop>());
        assert!(registry.alias_task("say", "echo").unwrap());
        assert!(registry.has_task("say"));
        assert!(registry.alias_task("shout", "missing").is_err());
    }
}
