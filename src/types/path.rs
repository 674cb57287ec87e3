// src/types/path.rs

use crate::constants::PATH_LIST_SEPARATOR;
use crate::core::{attributes::Attributes, project::Project, registry::DataType};
use anyhow::Result;
use std::any::Any;
use std::path::PathBuf;
use std::sync::Arc;

/// An ordered list of filesystem locations, e.g. a search path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathList {
    entries: Vec<PathBuf>,
}

impl PathList {
    /// The resolved entries in declaration order.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Appends an entry unless it is already present.
    pub fn push(&mut self, entry: PathBuf) {
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }
}

impl DataType for PathList {
    fn configure(&mut self, attributes: &Attributes, project: &Project) -> Result<()> {
        attributes.check_known("path", &["path", "location"])?;
        if let Some(location) = attributes.get("location") {
            self.push(project.resolve_file(location));
        }
        if let Some(list) = attributes.get("path") {
            for element in split_path_list(list, cfg!(windows)) {
                self.push(project.resolve_file(&element));
            }
        }
        Ok(())
    }

    fn to_property_string(&self) -> String {
        self.entries
            .iter()
            .map(|p| p.to_string_lossy())
            .collect::<Vec<_>>()
            .join(PATH_LIST_SEPARATOR)
    }

    fn into_shared(self: Box<Self>) -> Arc<dyn Any + Send + Sync> {
        Arc::new(*self)
    }
}

/// Splits a path list on `:` and `;`.
///
/// With `dos_drives`, a single letter followed by `:` and a slash is kept as a
/// drive prefix (`C:\tools`) instead of being split.
pub fn split_path_list(list: &str, dos_drives: bool) -> Vec<String> {
    let mut elements = Vec::new();
    let mut current = String::new();
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if dos_drives
                && current.len() == 1
                && current.chars().all(|d| d.is_ascii_alphabetic())
                && matches!(chars.peek(), Some('\\') | Some('/')) =>
            {
                current.push(c);
            }
            ':' | ';' => {
                if !current.trim().is_empty() {
                    elements.push(current.trim().to_string());
                }
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        elements.push(current.trim().to_string());
    }
    elements
}
