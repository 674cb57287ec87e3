//! # Build File Loader
//!
//! Turns an `anvil.toml` file into a ready-to-run [`Project`].
//!
//! Setup happens in a fixed order:
//!
//! 1. user properties (`-D`, then `--propertyfile`), then per-user defaults
//! 2. `[project]` metadata and `basedir`
//! 3. `[[taskdef]]` aliases
//! 4. `[[property]]` entries without `refid`, in declaration order
//! 5. `[[reference]]` data types, in declaration order
//! 6. `[[property]]` entries with `refid`
//! 7. `[[target]]` definitions
//!
//! Every reference id is reserved before step 4, so the set of ids is known
//! up front even though the objects are built later.

use crate::constants::BASEDIR_PROPERTY;
use crate::core::{
    attributes::Attributes,
    error::{BuildError, BuildResult},
    events::LogLevel,
    paths,
    project::{Project, TaskContext},
    properties::PropertyTier,
    registry::Task,
    target::{Target, TaskInvocation},
};
use crate::models::{self, BuildFile, PropertyEntry};
use crate::tasks::property::PropertyTask;
use std::fs;
use std::path::{Path, PathBuf};

/// What the caller supplies besides the build file itself.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// `-D name=value` pairs, in command-line order.
    pub user_properties: Vec<(String, String)>,
    /// `--propertyfile` paths, loaded as user properties.
    pub property_files: Vec<PathBuf>,
    /// Load `<config_dir>/anvil/anvil.properties` as inherited properties.
    pub load_user_defaults: bool,
    /// Record target failures and carry on with the remaining targets.
    pub keep_going: bool,
}

/// Reads and deserializes a build file.
pub fn parse_build_file(path: &Path) -> BuildResult<BuildFile> {
    let text = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    toml::from_str(&text).map_err(|source| BuildError::BuildFileParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads `path` into a fresh, initialized project.
pub fn load_project(path: &Path, options: &LoadOptions) -> BuildResult<Project> {
    let path = dunce::canonicalize(path).map_err(|e| BuildError::io(path, e))?;
    let build_file = parse_build_file(&path)?;
    log::debug!("Loaded build file '{}'", path.display());

    let mut project = Project::new();
    project.init();
    project.set_keep_going(options.keep_going);
    apply_user_properties(&mut project, options)?;

    let build_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    configure_project(&mut project, &build_file, &build_dir)?;
    Ok(project)
}

fn apply_user_properties(project: &mut Project, options: &LoadOptions) -> BuildResult<()> {
    for (name, value) in &options.user_properties {
        project.set_user_property(name, value);
    }
    for file in &options.property_files {
        let loaded = project.load_property_file(file, None, PropertyTier::User)?;
        log::debug!("Loaded {} user properties from '{}'", loaded, file.display());
    }
    if options.load_user_defaults {
        match paths::get_user_properties_path() {
            Ok(defaults) if defaults.is_file() => {
                project.load_property_file(&defaults, None, PropertyTier::Inherited)?;
            }
            Ok(_) => {}
            Err(e) => log::debug!("Skipping per-user defaults: {}", e),
        }
    }
    Ok(())
}

/// Applies a parsed build file to `project`. Relative paths in the file are
/// taken relative to `build_dir`.
pub fn configure_project(
    project: &mut Project,
    build_file: &BuildFile,
    build_dir: &Path,
) -> BuildResult<()> {
    // --- Metadata ---
    let section = &build_file.project;
    let basedir = match project.properties().get_in_tier(BASEDIR_PROPERTY, PropertyTier::User) {
        Some(forced) => paths::resolve_against(build_dir, forced),
        None => paths::resolve_against(build_dir, section.basedir.as_deref().unwrap_or(".")),
    };
    project.set_basedir(basedir);
    project.set_name(&section.name);
    project.set_description(section.description.clone());
    project.set_default_target(section.default.clone());

    // --- Task aliases ---
    for taskdef in &build_file.taskdefs {
        if !project.alias_task(&taskdef.name, &taskdef.task)? {
            project.log(
                &format!("Task '{}' is already defined; taskdef ignored.", taskdef.name),
                LogLevel::Warn,
            );
        }
    }

    // --- Properties and references ---
    for reference in &build_file.references {
        project.add_reference_placeholder(&reference.id);
    }
    let (by_reference, direct): (Vec<_>, Vec<_>) = build_file
        .properties
        .iter()
        .enumerate()
        .partition(|(_, entry)| entry.refid.is_some());
    for (index, entry) in direct {
        apply_property(project, index, entry)?;
    }
    for reference in &build_file.references {
        let attributes = models::to_attributes(&reference.attributes);
        let data_type = project.create_data_type(&reference.kind, &attributes)?;
        project.add_data_type_reference(&reference.id, data_type);
    }
    for (index, entry) in by_reference {
        apply_property(project, index, entry)?;
    }

    // --- Targets ---
    for entry in &build_file.targets {
        let mut target = Target::new(entry.name.clone());
        for dependency in entry.depends.names() {
            target.add_dependency(dependency);
        }
        if let Some(description) = &entry.description {
            target = target.with_description(description.clone());
        }
        if let Some(condition) = &entry.if_condition {
            target = target.with_if(condition.clone());
        }
        if let Some(condition) = &entry.unless {
            target = target.with_unless(condition.clone());
        }
        for task in &entry.tasks {
            target.add_task(TaskInvocation::new(
                task.task.clone(),
                models::to_attributes(&task.attributes),
            ));
        }
        project.add_target(target)?;
    }
    log::debug!(
        "Project '{}' has {} targets",
        project.name(),
        build_file.targets.len()
    );
    Ok(())
}

/// Runs a `[[property]]` entry exactly like a `property` task outside any target.
fn apply_property(project: &mut Project, index: usize, entry: &PropertyEntry) -> BuildResult<()> {
    let attributes = entry.to_attributes().resolve(project.properties())?;
    run_property_task(project, &attributes).map_err(|e| match e.downcast::<BuildError>() {
        Ok(build_error) => build_error,
        Err(source) => BuildError::Declaration {
            context: format!("[[property]] #{}", index + 1),
            source,
        },
    })
}

fn run_property_task(project: &mut Project, attributes: &Attributes) -> anyhow::Result<()> {
    let mut task = PropertyTask::default();
    task.configure(attributes)?;
    let mut ctx = TaskContext::new(project, "", "property");
    task.execute(&mut ctx)
}
