// src/tasks/mkdir.rs

use crate::core::{attributes::Attributes, registry::Executable};
use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Creates a directory and any missing parents.
///
/// It has no project access, so a relative `dir` is taken relative to the
/// process working directory; build files normally pass `${basedir}/...`.
#[derive(Debug, Default)]
pub struct Mkdir {
    dir: PathBuf,
}

impl Executable for Mkdir {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known("mkdir", &["dir"])?;
        self.dir = PathBuf::from(attributes.required("dir")?);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        if self.dir.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory '{}'", self.dir.display()))?;
        log::info!("Created dir: {}", self.dir.display());
        Ok(())
    }
}
