// src/core/attributes.rs

use crate::core::{error::BuildResult, properties::PropertyTable};
use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

/// The attribute set a task or data type is configured with.
///
/// Keys are case-sensitive; values are plain strings that the engine has
/// already passed through property expansion by the time a component sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    values: BTreeMap<String, String>,
}

impl Attributes {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Adds or replaces one attribute.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the value of `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Returns the value of `name` or an error naming the missing attribute.
    pub fn required(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| anyhow!("The '{}' attribute is required.", name))
    }

    /// Reads a boolean attribute (`true`/`yes`/`on` or `false`/`no`/`off`).
    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool> {
        match self.get(name) {
            None => Ok(default),
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "true" | "yes" | "on" => Ok(true),
                "false" | "no" | "off" => Ok(false),
                other => Err(anyhow!(
                    "Attribute '{}' expects a boolean, got '{}'.",
                    name,
                    other
                )),
            },
        }
    }

    /// Reads an unsigned integer attribute.
    pub fn get_u64(&self, name: &str) -> Result<Option<u64>> {
        self.get(name)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|e| {
                    anyhow!("Attribute '{}' expects a number, got '{}': {}", name, raw, e)
                })
            })
            .transpose()
    }

    /// Iterates over all `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterates over attributes starting with `prefix`, yielding the remainder of the name.
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v)))
    }

    /// Fails on the first attribute not listed in `known`.
    /// Names ending in `.` in `known` accept any attribute with that prefix.
    pub fn check_known(&self, owner: &str, known: &[&str]) -> Result<()> {
        for (name, _) in self.iter() {
            let accepted = known.iter().any(|k| {
                if k.ends_with('.') {
                    name.starts_with(k)
                } else {
                    name == *k
                }
            });
            if !accepted {
                return Err(anyhow!("'{}' doesn't support the '{}' attribute.", owner, name));
            }
        }
        Ok(())
    }

    /// Returns a copy with every value passed through `properties.replace_properties`.
    pub fn resolve(&self, properties: &PropertyTable) -> BuildResult<Self> {
        let mut values = BTreeMap::new();
        for (name, raw) in &self.values {
            values.insert(name.clone(), properties.replace_properties(raw)?);
        }
        Ok(Self { values })
    }

    /// Returns `true` if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
