//! # Project
//!
//! The execution engine. A `Project` owns the targets, the property table, the
//! component registry, the reference table and the event bus of one build.
//!
//! Execution is strictly sequential on the calling thread. For each requested
//! target the dependency order is computed first (which may fail before any
//! task runs), then each target in that order performs its tasks one after the
//! other. A failing task ends its target. Whether a failing target ends the
//! build depends on keep-going mode: when it is on, the first failure is kept,
//! the remaining targets still run, and the kept failure is returned at the end.
//!
//! Keep-going does not skip the dependents of a failed target; they run and
//! may fail on their own.

use crate::constants::{
    BASEDIR_PROPERTY, BUILD_ID_PROPERTY, PATH_LIST_SEPARATOR, PROJECT_NAME_PROPERTY,
    VERSION_PROPERTY,
};
use crate::core::{
    attributes::Attributes,
    error::{BuildError, BuildResult},
    events::{BuildEvent, BuildListener, EventBus, EventSubject, LogLevel},
    paths,
    properties::{PropertyTable, PropertyTier, SetOutcome},
    property_file,
    references::{ReferenceOutcome, ReferenceTable},
    registry::{ComponentFactory, ComponentRegistry, DataType, Task},
    resolver,
    target::{Target, TaskInvocation},
};
use crate::tasks;
use std::any::Any;
use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};
use std::sync::Arc;

/// What a running task sees of the build: its owning project plus the names it
/// was invoked under.
#[derive(Debug)]
pub struct TaskContext<'a> {
    project: &'a mut Project,
    target: &'a str,
    task: &'a str,
}

impl<'a> TaskContext<'a> {
    /// Creates a context for `task` running inside `target`.
    pub fn new(project: &'a mut Project, target: &'a str, task: &'a str) -> Self {
        Self {
            project,
            target,
            task,
        }
    }

    /// The owning project.
    pub fn project(&self) -> &Project {
        self.project
    }

    /// Mutable access to the owning project.
    pub fn project_mut(&mut self) -> &mut Project {
        self.project
    }

    /// The target being executed.
    pub fn target_name(&self) -> &str {
        self.target
    }

    /// The name the task was invoked by.
    pub fn task_name(&self) -> &str {
        self.task
    }

    /// Logs a message attributed to this task.
    pub fn log(&mut self, message: &str, level: LogLevel) {
        self.project.log_task(self.task, self.target, message, level);
    }
}

/// The build engine and its state.
#[derive(Debug)]
pub struct Project {
    name: String,
    description: Option<String>,
    default_target: Option<String>,
    basedir: PathBuf,
    targets: HashMap<String, Arc<Target>>,
    target_order: Vec<String>,
    properties: PropertyTable,
    registry: ComponentRegistry,
    references: ReferenceTable,
    events: EventBus,
    keep_going: bool,
    requested_targets: Vec<String>,
    call_stack: Vec<String>,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Creates an empty project with no definitions and no properties.
    pub fn new() -> Self {
        Self {
            name: String::new(),
            description: None,
            default_target: None,
            basedir: PathBuf::from("."),
            targets: HashMap::new(),
            target_order: Vec::new(),
            properties: PropertyTable::new(),
            registry: ComponentRegistry::new(),
            references: ReferenceTable::new(),
            events: EventBus::new(),
            keep_going: false,
            requested_targets: Vec::new(),
            call_stack: Vec::new(),
        }
    }

    /// Registers the built-in tasks and data types and sets system properties.
    pub fn init(&mut self) {
        tasks::register_builtins(&mut self.registry);
        self.set_system_properties();
    }

    fn set_system_properties(&mut self) {
        let build_id = uuid::Uuid::new_v4().to_string();
        let mut system = vec![
            (VERSION_PROPERTY, env!("CARGO_PKG_VERSION").to_string()),
            (BUILD_ID_PROPERTY, build_id),
            ("os.name", std::env::consts::OS.to_string()),
            ("os.arch", std::env::consts::ARCH.to_string()),
            ("file.separator", MAIN_SEPARATOR_STR.to_string()),
            ("path.separator", PATH_LIST_SEPARATOR.to_string()),
        ];
        if let Ok(cwd) = std::env::current_dir() {
            system.push(("user.dir", cwd.to_string_lossy().into_owned()));
        }
        if let Some(home) = dirs::home_dir() {
            system.push(("user.home", home.to_string_lossy().into_owned()));
        }
        for (name, value) in system {
            self.properties
                .set_property(name, &value, PropertyTier::Inherited, false);
        }
    }

    // --- Metadata ---

    /// The project name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the project name and the `anvil.project.name` property.
    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
        self.set_property(PROJECT_NAME_PROPERTY, name);
    }

    /// The project description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Sets the project description.
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    /// Sets the target run when none is requested.
    pub fn set_default_target(&mut self, name: Option<String>) {
        self.default_target = name;
    }

    /// The configured default target, or the first declared one.
    pub fn default_target_name(&self) -> Option<&str> {
        self.default_target
            .as_deref()
            .or_else(|| self.target_order.first().map(String::as_str))
    }

    /// The directory relative paths are resolved against.
    pub fn basedir(&self) -> &Path {
        &self.basedir
    }

    /// Sets the base directory and the `basedir` property.
    pub fn set_basedir(&mut self, basedir: PathBuf) {
        let shown = basedir.to_string_lossy().into_owned();
        self.basedir = basedir;
        self.set_property_in_tier(BASEDIR_PROPERTY, &shown, PropertyTier::Plain, true);
    }

    /// Resolves `path` against the base directory.
    pub fn resolve_file(&self, path: &str) -> PathBuf {
        paths::resolve_against(&self.basedir, path)
    }

    /// Turns keep-going mode on or off.
    pub fn set_keep_going(&mut self, keep_going: bool) {
        self.keep_going = keep_going;
    }

    /// Whether keep-going mode is on.
    pub fn is_keep_going(&self) -> bool {
        self.keep_going
    }

    /// The names passed to the most recent `execute_targets` call.
    pub fn requested_targets(&self) -> &[String] {
        &self.requested_targets
    }

    // --- Targets ---

    /// Adds a target. Fails if a target with the same name already exists.
    pub fn add_target(&mut self, target: Target) -> BuildResult<()> {
        if self.targets.contains_key(target.name()) {
            return Err(BuildError::DuplicateTarget {
                name: target.name().to_string(),
            });
        }
        self.add_or_replace_target(target);
        Ok(())
    }

    /// Adds a target, replacing any existing one with the same name.
    pub fn add_or_replace_target(&mut self, target: Target) {
        let name = target.name().to_string();
        if self.targets.insert(name.clone(), Arc::new(target)).is_some() {
            log::debug!("Replacing target '{}'", name);
        } else {
            self.target_order.push(name);
        }
    }

    /// Looks a target up by name.
    pub fn target(&self, name: &str) -> Option<&Arc<Target>> {
        self.targets.get(name)
    }

    /// All targets in declaration order.
    pub fn targets_in_order(&self) -> impl Iterator<Item = &Arc<Target>> {
        self.target_order
            .iter()
            .filter_map(|name| self.targets.get(name))
    }

    /// Computes the execution order for `root` without running anything.
    pub fn resolve_order(&self, root: &str) -> BuildResult<Vec<Arc<Target>>> {
        resolver::resolve(&self.targets, &self.target_order, root)
    }

    // --- Properties ---

    /// Read access to the property table.
    pub fn properties(&self) -> &PropertyTable {
        &self.properties
    }

    /// The merged value of a property.
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name)
    }

    /// Writes a property in `tier`, logging at verbose level if the write is ignored.
    pub fn set_property_in_tier(
        &mut self,
        name: &str,
        value: &str,
        tier: PropertyTier,
        override_allowed: bool,
    ) -> SetOutcome {
        let outcome = self
            .properties
            .set_property(name, value, tier, override_allowed);
        match outcome {
            SetOutcome::Written => {}
            SetOutcome::ShadowedByUser => self.log(
                &format!("Override ignored for user property '{}'", name),
                LogLevel::Verbose,
            ),
            SetOutcome::AlreadySet => self.log(
                &format!("Override ignored for property '{}'", name),
                LogLevel::Verbose,
            ),
        }
        outcome
    }

    /// Sets a plain property. The first write wins.
    pub fn set_property(&mut self, name: &str, value: &str) -> SetOutcome {
        self.set_property_in_tier(name, value, PropertyTier::Plain, false)
    }

    /// Sets a plain property even if it already has a value.
    pub fn override_property(&mut self, name: &str, value: &str) -> SetOutcome {
        self.set_property_in_tier(name, value, PropertyTier::Plain, true)
    }

    /// Sets a user property.
    pub fn set_user_property(&mut self, name: &str, value: &str) -> SetOutcome {
        self.set_property_in_tier(name, value, PropertyTier::User, false)
    }

    /// Sets an inherited property.
    pub fn set_inherited_property(&mut self, name: &str, value: &str) -> SetOutcome {
        self.set_property_in_tier(name, value, PropertyTier::Inherited, false)
    }

    /// Expands `${...}` tokens in `text`.
    pub fn replace_properties(&self, text: &str) -> BuildResult<String> {
        self.properties.replace_properties(text)
    }

    /// Loads a `.properties` file into `tier`, resolving references between its
    /// entries. Returns the number of properties written.
    pub fn load_property_file(
        &mut self,
        path: &Path,
        prefix: Option<&str>,
        tier: PropertyTier,
    ) -> BuildResult<usize> {
        let entries = property_file::read_properties_file(path)?;
        self.add_property_entries(&entries, prefix, tier)
    }

    /// Resolves a set of related entries together and writes them into `tier`.
    ///
    /// Names that already hold a value in `tier` keep it, in every tier.
    /// Returns the number of properties written.
    pub fn add_property_entries(
        &mut self,
        entries: &[(String, String)],
        prefix: Option<&str>,
        tier: PropertyTier,
    ) -> BuildResult<usize> {
        let properties = &self.properties;
        let resolved =
            property_file::resolve_all(entries, |name| properties.get(name).map(str::to_string))?;

        let prefix = match prefix {
            Some(p) if !p.is_empty() && !p.ends_with('.') => format!("{}.", p),
            Some(p) => p.to_string(),
            None => String::new(),
        };
        let mut written = 0;
        for (name, value) in &resolved {
            let name = format!("{}{}", prefix, name);
            if tier != PropertyTier::Plain && self.properties.get_in_tier(&name, tier).is_some() {
                log::debug!("Keeping earlier {:?} value of '{}'", tier, name);
                continue;
            }
            if self.set_property_in_tier(&name, value, tier, false) == SetOutcome::Written {
                written += 1;
            }
        }
        Ok(written)
    }

    // --- Components ---

    /// Read access to the component registry.
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Registers a task definition. The first definition of a name wins.
    pub fn add_task_definition(&mut self, name: &str, factory: ComponentFactory) -> bool {
        self.registry.add_task_definition(name, factory)
    }

    /// Registers a data-type definition. The first definition of a name wins.
    pub fn add_data_type_definition(&mut self, name: &str, factory: ComponentFactory) -> bool {
        self.registry.add_data_type_definition(name, factory)
    }

    /// Makes `alias` another name for the task `existing`.
    pub fn alias_task(&mut self, alias: &str, existing: &str) -> BuildResult<bool> {
        self.registry.alias_task(alias, existing)
    }

    /// Creates a task by name. `Ok(None)` if no such task is registered.
    pub fn create_task(&self, name: &str) -> BuildResult<Option<Box<dyn Task>>> {
        self.registry.create_task(name)
    }

    /// Creates a data type by name and configures it with property-expanded attributes.
    pub fn create_data_type(
        &self,
        type_name: &str,
        attributes: &Attributes,
    ) -> BuildResult<Box<dyn DataType>> {
        let mut data_type = self.registry.create_data_type(type_name)?.ok_or_else(|| {
            BuildError::UnknownComponent {
                kind: "type",
                name: type_name.to_string(),
            }
        })?;
        let attributes = attributes.resolve(&self.properties)?;
        data_type
            .configure(&attributes, self)
            .map_err(|source| BuildError::ComponentCreation {
                kind: "type",
                name: type_name.to_string(),
                source,
            })?;
        Ok(data_type)
    }

    // --- References ---

    /// Read access to the reference table.
    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Reserves a reference id for an object that will be added later.
    pub fn add_reference_placeholder(&mut self, id: &str) {
        self.references.add_placeholder(id);
    }

    /// Stores an arbitrary object under `id`, warning if a real value is replaced.
    pub fn add_reference(
        &mut self,
        id: &str,
        value: Arc<dyn Any + Send + Sync>,
        text: Option<String>,
    ) {
        if self.references.add(id, value, text) == ReferenceOutcome::Overwritten {
            self.log(
                &format!("Overriding previous definition of reference to '{}'", id),
                LogLevel::Warn,
            );
        }
    }

    /// Stores a configured data type under `id`.
    pub fn add_data_type_reference(&mut self, id: &str, data_type: Box<dyn DataType>) {
        let text = data_type.to_property_string();
        self.add_reference(id, data_type.into_shared(), Some(text));
    }

    /// Looks a reference up as a `T`.
    pub fn get_reference_as<T: Any + Send + Sync>(&self, id: &str) -> BuildResult<Option<Arc<T>>> {
        self.references.get_as::<T>(id)
    }

    // --- Events ---

    /// Registers a listener. Listeners are called in registration order.
    pub fn add_build_listener(&mut self, listener: Box<dyn BuildListener>) {
        self.events.add_listener(listener);
    }

    /// Mutable access to the event bus.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Logs a project-level message.
    pub fn log(&mut self, message: &str, level: LogLevel) {
        let event = BuildEvent::new(EventSubject::Build {
            project: &self.name,
        })
        .with_message(message, level);
        self.events.fire_message_logged(&event);
    }

    /// Logs a message attributed to a target.
    pub fn log_target(&mut self, target: &str, message: &str, level: LogLevel) {
        let event =
            BuildEvent::new(EventSubject::Target { target }).with_message(message, level);
        self.events.fire_message_logged(&event);
    }

    /// Logs a message attributed to a task.
    pub fn log_task(&mut self, task: &str, target: &str, message: &str, level: LogLevel) {
        let event =
            BuildEvent::new(EventSubject::Task { task, target }).with_message(message, level);
        self.events.fire_message_logged(&event);
    }

    /// Fires `build_started`.
    pub fn fire_build_started(&mut self) {
        let event = BuildEvent::new(EventSubject::Build {
            project: &self.name,
        });
        self.events.fire_build_started(&event);
    }

    /// Fires `build_finished` with the failure, if any.
    pub fn fire_build_finished(&mut self, error: Option<&BuildError>) {
        let event = BuildEvent::new(EventSubject::Build {
            project: &self.name,
        })
        .with_error(error);
        self.events.fire_build_finished(&event);
    }

    // --- Execution ---

    /// Runs a whole build: `build_started`, the requested targets, `build_finished`.
    pub fn run_build(&mut self, names: &[String]) -> BuildResult<()> {
        self.fire_build_started();
        let result = self.execute_targets(names);
        self.fire_build_finished(result.as_ref().err());
        result
    }

    /// Executes each requested target in turn. An empty list means the default target.
    ///
    /// With keep-going on, a failing target does not stop the list; the first
    /// failure is returned once every name has been attempted. Resolution
    /// errors always stop the build at once.
    pub fn execute_targets(&mut self, names: &[String]) -> BuildResult<()> {
        let names: Vec<String> = if names.is_empty() {
            let default = self
                .default_target_name()
                .ok_or_else(|| BuildError::NoDefaultTarget {
                    project: self.name.clone(),
                })?;
            vec![default.to_string()]
        } else {
            names.to_vec()
        };
        self.requested_targets = names.clone();

        let mut retained: Option<BuildError> = None;
        for name in &names {
            match self.execute_target(name) {
                Ok(()) => {}
                Err(e) if self.keep_going && !e.is_resolution_error() => {
                    if retained.is_none() {
                        retained = Some(e);
                    } else {
                        log::debug!("Additional failure while building '{}': {}", name, e);
                    }
                }
                Err(e) => return Err(e),
            }
        }
        retained.map_or(Ok(()), Err)
    }

    /// Executes `name` and everything it depends on, each target once.
    pub fn execute_target(&mut self, name: &str) -> BuildResult<()> {
        let sorted = match self.resolve_order(name) {
            Ok(sorted) => sorted,
            Err(e) => {
                self.log(
                    &format!("Cannot order targets for '{}': {}", name, e),
                    LogLevel::Error,
                );
                return Err(e);
            }
        };

        let mut retained: Option<BuildError> = None;
        for target in sorted {
            if let Err(e) = self.run_target(&target) {
                self.log(
                    &format!("Target '{}' failed with message '{}'.", target.name(), e),
                    LogLevel::Error,
                );
                if !self.keep_going {
                    return Err(e);
                }
                if retained.is_none() {
                    retained = Some(e);
                }
            }
            if target.name() == name {
                break;
            }
        }
        retained.map_or(Ok(()), Err)
    }

    fn run_target(&mut self, target: &Target) -> BuildResult<()> {
        let subject = EventSubject::Target {
            target: target.name(),
        };
        self.events.fire_target_started(&BuildEvent::new(subject));
        let result = self.perform_tasks(target);
        self.events
            .fire_target_finished(&BuildEvent::new(subject).with_error(result.as_ref().err()));
        result
    }

    /// Checks the target's guard, then runs its tasks in order. The first failing
    /// task ends the target.
    pub fn perform_tasks(&mut self, target: &Target) -> BuildResult<()> {
        if let Some(reason) = target.skip_reason(&self.properties)? {
            self.log_target(target.name(), &reason, LogLevel::Verbose);
            return Ok(());
        }
        for invocation in target.tasks() {
            self.run_task(target.name(), invocation)?;
        }
        Ok(())
    }

    fn run_task(&mut self, target: &str, invocation: &TaskInvocation) -> BuildResult<()> {
        let subject = EventSubject::Task {
            task: &invocation.task,
            target,
        };
        self.events.fire_task_started(&BuildEvent::new(subject));
        let result = self.invoke_task(target, invocation);
        self.events
            .fire_task_finished(&BuildEvent::new(subject).with_error(result.as_ref().err()));
        result
    }

    fn invoke_task(&mut self, target: &str, invocation: &TaskInvocation) -> BuildResult<()> {
        let attributes = invocation.attributes.resolve(&self.properties)?;
        let mut task =
            self.create_task(&invocation.task)?
                .ok_or_else(|| BuildError::UnknownComponent {
                    kind: "task",
                    name: invocation.task.clone(),
                })?;

        let wrap = |e: anyhow::Error| into_build_error(e, target, &invocation.task);
        task.configure(&attributes).map_err(wrap)?;
        let mut ctx = TaskContext::new(self, target, &invocation.task);
        task.execute(&mut ctx).map_err(wrap)
    }

    // --- Sub-builds ---

    /// Creates an independent project for a nested build.
    ///
    /// Target and component definitions are shared (they are immutable during
    /// execution). User properties are always copied; the rest of the properties
    /// only with `inherit_all`, references only with `inherit_refs`. Listeners are
    /// not copied.
    pub fn create_subproject(&self, inherit_all: bool, inherit_refs: bool) -> Self {
        let mut sub = Self {
            name: self.name.clone(),
            description: self.description.clone(),
            default_target: self.default_target.clone(),
            basedir: self.basedir.clone(),
            targets: self.targets.clone(),
            target_order: self.target_order.clone(),
            properties: PropertyTable::new(),
            registry: self.registry.clone(),
            references: if inherit_refs {
                self.references.clone()
            } else {
                ReferenceTable::new()
            },
            events: EventBus::new(),
            keep_going: self.keep_going,
            requested_targets: Vec::new(),
            call_stack: self.call_stack.clone(),
        };
        sub.set_system_properties();

        for (name, value) in self.properties.tier(PropertyTier::User) {
            sub.properties
                .set_property(name, value, PropertyTier::User, false);
        }
        if inherit_all {
            let user = self.properties.tier(PropertyTier::User);
            for (name, value) in self.properties.merged() {
                if !user.contains_key(&name) {
                    sub.properties
                        .set_property(&name, &value, PropertyTier::Inherited, false);
                }
            }
        } else {
            let basedir = self.basedir.to_string_lossy().into_owned();
            sub.properties
                .set_property(BASEDIR_PROPERTY, &basedir, PropertyTier::Plain, false);
            sub.properties
                .set_property(PROJECT_NAME_PROPERTY, &self.name, PropertyTier::Plain, false);
        }
        sub
    }

    /// Targets of enclosing builds that are waiting on a `call`, outermost first.
    pub fn call_stack(&self) -> &[String] {
        &self.call_stack
    }

    /// Records that `caller` is waiting on a nested build of this project.
    pub fn enter_call(&mut self, caller: &str) {
        self.call_stack.push(caller.to_string());
    }

    /// Fails with `CircularDependency` if running `callee` here would run a
    /// target that is still waiting on a call, which would never terminate.
    pub fn check_call_cycle(&self, callee: &str) -> BuildResult<()> {
        for target in self.resolve_order(callee)? {
            let Some(start) = self.call_stack.iter().position(|n| n == target.name()) else {
                continue;
            };
            let mut path: Vec<String> = self.call_stack.iter().skip(start).cloned().collect();
            path.push(callee.to_string());
            if target.name() != callee {
                path.push(target.name().to_string());
            }
            return Err(BuildError::CircularDependency { path });
        }
        Ok(())
    }
}

/// Keeps a recognized `BuildError` as-is, wraps anything else with the target
/// and task it came from.
///
/// Resolution errors raised by a task (e.g. `call` naming a missing target) are
/// wrapped too, so keep-going treats them as a task failure and not as a broken
/// graph in this project.
fn into_build_error(e: anyhow::Error, target: &str, task: &str) -> BuildError {
    let wrap = |source: anyhow::Error| BuildError::TargetExecution {
        target: target.to_string(),
        task: task.to_string(),
        source,
    };
    match e.downcast::<BuildError>() {
        Ok(build_error) if build_error.is_resolution_error() => wrap(build_error.into()),
        Ok(build_error) => build_error,
        Err(other) => wrap(other),
    }
}
