// src/tasks/property.rs

use crate::core::{
    attributes::Attributes, events::LogLevel, project::TaskContext, properties::PropertyTier,
    registry::Task,
};
use anyhow::{Result, anyhow, bail};

/// Sets plain properties from a literal value, a reference, a `.properties`
/// file or the process environment. Properties that already exist keep their
/// value.
#[derive(Debug, Default)]
pub struct PropertyTask {
    name: Option<String>,
    value: Option<String>,
    refid: Option<String>,
    file: Option<String>,
    prefix: Option<String>,
    environment: Option<String>,
}

impl PropertyTask {
    fn owned(attributes: &Attributes, name: &str) -> Option<String> {
        attributes.get(name).map(str::to_string)
    }
}

impl Task for PropertyTask {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known(
            "property",
            &["name", "value", "refid", "file", "prefix", "environment"],
        )?;
        self.name = Self::owned(attributes, "name");
        self.value = Self::owned(attributes, "value");
        self.refid = Self::owned(attributes, "refid");
        self.file = Self::owned(attributes, "file");
        self.prefix = Self::owned(attributes, "prefix");
        self.environment = Self::owned(attributes, "environment");

        match (&self.name, &self.value, &self.refid) {
            (Some(_), None, None) => bail!("You must specify value or refid with the name attribute."),
            (None, Some(_), _) | (None, _, Some(_)) => {
                bail!("The value and refid attributes need a name attribute.")
            }
            _ => {}
        }
        if self.name.is_none() && self.file.is_none() && self.environment.is_none() {
            bail!("You must specify name, file or environment.");
        }
        if self.prefix.is_some() && self.file.is_none() {
            bail!("Prefix is only valid when loading from a file.");
        }
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        if let Some(name) = &self.name {
            let value = match (&self.value, &self.refid) {
                (Some(value), _) => value.clone(),
                (None, Some(refid)) => ctx
                    .project()
                    .references()
                    .to_text(refid)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("Reference '{}' not found.", refid))?,
                (None, None) => return Ok(()),
            };
            ctx.project_mut().set_property(name, &value);
        }

        if let Some(file) = &self.file {
            let path = ctx.project().resolve_file(file);
            if path.is_file() {
                let loaded = ctx.project_mut().load_property_file(
                    &path,
                    self.prefix.as_deref(),
                    PropertyTier::Plain,
                )?;
                ctx.log(
                    &format!("Loaded {} properties from {}", loaded, path.display()),
                    LogLevel::Verbose,
                );
            } else {
                ctx.log(
                    &format!("Unable to find property file: {}", path.display()),
                    LogLevel::Verbose,
                );
            }
        }

        if let Some(prefix) = &self.environment {
            let prefix = prefix.trim_end_matches('.');
            let mut vars: Vec<(String, String)> = std::env::vars().collect();
            vars.sort();
            for (key, value) in vars {
                ctx.project_mut()
                    .set_property(&format!("{}.{}", prefix, key), &value);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{attributes::Attributes, error::BuildError, events::LogLevel};
    use crate::tasks::test_support::{project_with_log, run_single};
    use std::fs;

    #[test]
    fn test_name_value_is_first_write_wins() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        let first = Attributes::new().with("name", "dist").with("value", "out");
        let second = Attributes::new().with("name", "dist").with("value", "elsewhere");
        run_single(&mut project, "property", first).unwrap();
        run_single(&mut project, "property", second).unwrap();
        assert_eq!(project.property("dist"), Some("out"));
    }

    #[test]
    fn test_user_property_wins_over_task() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        project.set_user_property("mode", "release");
        run_single(
            &mut project,
            "property",
            Attributes::new().with("name", "mode").with("value", "debug"),
        )
        .unwrap();
        assert_eq!(project.property("mode"), Some("release"));
    }

    #[test]
    fn test_refid_renders_reference_text() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        project.add_reference(
            "greeting",
            std::sync::Arc::new("hi".to_string()),
            Some("hi".to_string()),
        );
        run_single(
            &mut project,
            "property",
            Attributes::new().with("name", "g").with("refid", "greeting"),
        )
        .unwrap();
        assert_eq!(project.property("g"), Some("hi"));

        let missing = Attributes::new().with("name", "h").with("refid", "nothing");
        assert!(run_single(&mut project, "property", missing).is_err());
    }

    #[test]
    fn test_file_with_prefix_and_cross_references() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("build.properties"),
            "root=/srv\nlib=${root}/lib\n# comment\nname = ${project}\n",
        )
        .unwrap();
        let (mut project, _) = project_with_log(LogLevel::Info);
        project.set_basedir(dir.path().to_path_buf());
        project.set_property("project", "anvil");

        // --- Execute ---
        run_single(
            &mut project,
            "property",
            Attributes::new().with("file", "build.properties").with("prefix", "cfg"),
        )
        .unwrap();

        // --- Assert ---
        assert_eq!(project.property("cfg.lib"), Some("/srv/lib"));
        assert_eq!(project.property("cfg.name"), Some("anvil"));
        assert_eq!(project.property("lib"), None);
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (mut project, lines) = project_with_log(LogLevel::Verbose);
        project.set_basedir(dir.path().to_path_buf());
        run_single(&mut project, "property", Attributes::new().with("file", "absent.properties"))
            .unwrap();
        assert!(lines.lock().unwrap().iter().any(|l| l.contains("Unable to find property file")));
    }

    #[test]
    fn test_cyclic_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("loop.properties"), "a=${b}\nb=${a}\n").unwrap();
        let (mut project, _) = project_with_log(LogLevel::Info);
        project.set_basedir(dir.path().to_path_buf());
        let err = run_single(&mut project, "property", Attributes::new().with("file", "loop.properties"))
            .unwrap_err();
        assert!(matches!(err, BuildError::CircularProperty { .. }));
    }

    #[test]
    fn test_environment_prefix() {
        let Some((key, value)) = std::env::vars().next() else {
            return;
        };
        let (mut project, _) = project_with_log(LogLevel::Info);
        run_single(&mut project, "property", Attributes::new().with("environment", "env."))
            .unwrap();
        assert_eq!(project.property(&format!("env.{}", key)), Some(value.as_str()));
    }

    #[test]
    fn test_invalid_combinations() {
        let (mut project, _) = project_with_log(LogLevel::Info);
        for attributes in [
            Attributes::new().with("name", "x"),
            Attributes::new().with("value", "x"),
            Attributes::new(),
            Attributes::new().with("name", "x").with("value", "y").with("prefix", "p"),
        ] {
            assert!(run_single(&mut project, "property", attributes).is_err());
        }
    }
}
