// src/models.rs

use crate::core::attributes::Attributes;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

// --- BUILD FILE MODELS (FOR TOML) ---
// These mirror what the user writes in anvil.toml.

/// The whole build file.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct BuildFile {
    pub project: ProjectSection,
    #[serde(default, rename = "property")]
    pub properties: Vec<PropertyEntry>,
    #[serde(default, rename = "taskdef")]
    pub taskdefs: Vec<TaskDefEntry>,
    #[serde(default, rename = "reference")]
    pub references: Vec<ReferenceEntry>,
    #[serde(default, rename = "target")]
    pub targets: Vec<TargetEntry>,
}

/// The `[project]` table.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
    /// Relative to the directory holding the build file.
    #[serde(default)]
    pub basedir: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A scalar attribute value. Numbers and booleans are accepted so that
/// `seconds = 2` or `failonerror = false` read naturally.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// One `[[property]]` entry. Same attributes as the `property` task.
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct PropertyEntry {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<AttributeValue>,
    #[serde(default)]
    pub refid: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
}

impl PropertyEntry {
    /// The entry as raw `property` task attributes.
    pub fn to_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        let text_fields = [
            ("name", &self.name),
            ("refid", &self.refid),
            ("file", &self.file),
            ("prefix", &self.prefix),
            ("environment", &self.environment),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                attributes.insert(key, value.as_str());
            }
        }
        if let Some(value) = &self.value {
            attributes.insert("value", value.to_string());
        }
        attributes
    }
}

/// One `[[taskdef]]` entry: makes `name` another name for the task `task`.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TaskDefEntry {
    pub name: String,
    pub task: String,
}

/// One `[[reference]]` entry: a data type stored under `id`.
#[derive(Deserialize, Debug, Clone)]
pub struct ReferenceEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// `depends` may be a list or a comma-separated string.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Depends {
    Sequence(Vec<String>),
    Single(String),
}

impl Default for Depends {
    fn default() -> Self {
        Self::Sequence(Vec::new())
    }
}

impl Depends {
    /// The dependency names in order, trimmed, without empty entries.
    pub fn names(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Self::Sequence(items) => items.iter().map(String::as_str).collect(),
            Self::Single(text) => text.split(',').collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// One `[[target]]` entry.
#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct TargetEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub depends: Depends,
    #[serde(default, rename = "if")]
    pub if_condition: Option<String>,
    #[serde(default)]
    pub unless: Option<String>,
    #[serde(default)]
    pub tasks: Vec<TaskEntry>,
}

/// One task call inside a target: `{ task = "echo", message = "..." }`.
#[derive(Deserialize, Debug, Clone)]
pub struct TaskEntry {
    pub task: String,
    #[serde(flatten)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Converts flattened TOML attributes into raw [`Attributes`].
pub fn to_attributes(values: &BTreeMap<String, AttributeValue>) -> Attributes {
    values.iter().map(|(k, v)| (k.clone(), v.to_string())).collect()
}
