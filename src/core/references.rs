// src/core/references.rs

use crate::core::error::{BuildError, BuildResult};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A stored reference: a type-erased object plus an optional textual form.
#[derive(Clone)]
struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    text: Option<String>,
    placeholder: bool,
}

/// What `add` did with an id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOutcome {
    /// The id was not known before.
    Added,
    /// The id only held a placeholder, which was replaced silently.
    ReplacedPlaceholder,
    /// A real value was overwritten. Callers should warn.
    Overwritten,
}

/// `id -> object` store for named reuse across a build description.
#[derive(Clone, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for ReferenceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.entries.keys().collect();
        ids.sort();
        f.debug_struct("ReferenceTable").field("ids", &ids).finish()
    }
}

impl ReferenceTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `id`. `text` is what `to_text` returns for it.
    pub fn add(
        &mut self,
        id: &str,
        value: Arc<dyn Any + Send + Sync>,
        text: Option<String>,
    ) -> ReferenceOutcome {
        let outcome = match self.entries.get(id) {
            None => ReferenceOutcome::Added,
            Some(old) if old.placeholder => ReferenceOutcome::ReplacedPlaceholder,
            Some(_) => ReferenceOutcome::Overwritten,
        };
        self.entries.insert(
            id.to_string(),
            Entry {
                value,
                text,
                placeholder: false,
            },
        );
        outcome
    }

    /// Stores a plain string under `id`.
    pub fn add_text(&mut self, id: &str, text: &str) -> ReferenceOutcome {
        self.add(id, Arc::new(text.to_string()), Some(text.to_string()))
    }

    /// Reserves `id` for an object that has not been built yet.
    /// Does nothing if `id` already holds something.
    pub fn add_placeholder(&mut self, id: &str) {
        self.entries.entry(id.to_string()).or_insert_with(|| Entry {
            value: Arc::new(()),
            text: None,
            placeholder: true,
        });
    }

    /// Returns `true` if `id` holds a real value.
    pub fn contains(&self, id: &str) -> bool {
        self.entries.get(id).is_some_and(|e| !e.placeholder)
    }

    /// Returns the type-erased value stored under `id`.
    pub fn get(&self, id: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.entries
            .get(id)
            .filter(|e| !e.placeholder)
            .map(|e| e.value.clone())
    }

    /// Returns the value under `id` as a `T`.
    ///
    /// `Ok(None)` if nothing is stored; `TypeMismatch` if something else is.
    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> BuildResult<Option<Arc<T>>> {
        let Some(value) = self.get(id) else {
            return Ok(None);
        };
        value
            .downcast::<T>()
            .map(Some)
            .map_err(|_| BuildError::TypeMismatch {
                name: id.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Returns the textual form of the value under `id`, if it has one.
    pub fn to_text(&self, id: &str) -> Option<&str> {
        self.entries
            .get(id)
            .filter(|e| !e.placeholder)
            .and_then(|e| e.text.as_deref())
    }

    /// All ids holding real values, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| !e.placeholder)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }
}
