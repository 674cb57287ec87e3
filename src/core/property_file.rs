//! # Property Files
//!
//! Reads Java-style `.properties` files and resolves the references their
//! entries make to each other. Unlike ordinary property reads, loading a file
//! expands `${...}` transitively, so a cycle inside the file is an error.

use crate::core::{
    error::{BuildError, BuildResult},
    properties::{self, Fragment},
};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Parses `.properties` text into `(name, raw value)` pairs in file order.
/// A name that appears twice keeps its last value, at its first position.
pub fn parse_properties(content: &str) -> Vec<(String, String)> {
    let mut entries: Vec<(String, String)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for logical_line in logical_lines(content) {
        let Some((key, value)) = split_entry(&logical_line) else {
            continue;
        };
        match positions.get(&key) {
            Some(&idx) => {
                if let Some(entry) = entries.get_mut(idx) {
                    entry.1 = value;
                }
            }
            None => {
                positions.insert(key.clone(), entries.len());
                entries.push((key, value));
            }
        }
    }
    entries
}

/// Reads and parses a properties file from disk.
pub fn read_properties_file(path: &Path) -> BuildResult<Vec<(String, String)>> {
    log::debug!("Loading properties from '{}'", path.display());
    let content = fs::read_to_string(path).map_err(|e| BuildError::io(path, e))?;
    Ok(parse_properties(&content))
}

/// Expands references between `entries`.
///
/// A `${name}` that names another entry of the same set is replaced by that
/// entry's fully resolved value. Other names are looked up through `fallback`
/// (normally the project's properties) and left verbatim if it has no answer.
///
/// # Errors
/// `BuildError::CircularProperty` when an entry depends on itself, directly or
/// through other entries. `BuildError::UnclosedPropertyToken` on a malformed value.
pub fn resolve_all<F>(entries: &[(String, String)], fallback: F) -> BuildResult<Vec<(String, String)>>
where
    F: Fn(&str) -> Option<String>,
{
    let raw: HashMap<&str, &str> = entries
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    let mut resolver = FileResolver {
        raw,
        resolved: HashMap::new(),
        stack: Vec::new(),
        fallback,
    };

    entries
        .iter()
        .map(|(name, _)| Ok((name.clone(), resolver.resolve(name)?)))
        .collect()
}

struct FileResolver<'a, F> {
    raw: HashMap<&'a str, &'a str>,
    resolved: HashMap<String, String>,
    stack: Vec<String>,
    fallback: F,
}

impl<F> FileResolver<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&mut self, name: &str) -> BuildResult<String> {
        if let Some(done) = self.resolved.get(name) {
            return Ok(done.clone());
        }
        if self.stack.iter().any(|n| n == name) {
            return Err(BuildError::CircularProperty {
                name: name.to_string(),
            });
        }
        let Some(raw_value) = self.raw.get(name).copied() else {
            return Ok(format!("${{{}}}", name));
        };

        self.stack.push(name.to_string());
        let mut value = String::with_capacity(raw_value.len());
        for fragment in properties::parse_property_string(raw_value)? {
            match fragment {
                Fragment::Literal(s) => value.push_str(&s),
                Fragment::Reference(r) if self.raw.contains_key(r.as_str()) => {
                    value.push_str(&self.resolve(&r)?);
                }
                Fragment::Reference(r) => match (self.fallback)(&r) {
                    Some(v) => value.push_str(&v),
                    None => {
                        value.push_str("${");
                        value.push_str(&r);
                        value.push('}');
                    }
                },
            }
        }
        self.stack.pop();

        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

/// Joins continuation lines and drops blanks and comments.
fn logical_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw_line in content.lines() {
        let line = match current {
            Some(_) => raw_line.trim_start(),
            None => {
                let trimmed = raw_line.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed
            }
        };

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        let continues = trailing % 2 == 1;
        let body = if continues {
            line.get(..line.len() - 1).unwrap_or("")
        } else {
            line
        };

        current.get_or_insert_with(String::new).push_str(body);
        if !continues {
            if let Some(done) = current.take() {
                lines.push(done);
            }
        }
    }
    if let Some(rest) = current {
        lines.push(rest);
    }
    lines
}

/// Splits a logical line into an unescaped key and value.
fn split_entry(line: &str) -> Option<(String, String)> {
    let mut chars = line.char_indices().peekable();
    let mut key_end = line.len();
    let mut escaped = false;

    while let Some((idx, c)) = chars.next() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let key = unescape(line.get(..key_end)?);
    if key.is_empty() {
        return None;
    }

    // Skip whitespace, at most one separator, then whitespace again.
    let mut rest = line.get(key_end..).unwrap_or("").trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }
    Some((key, unescape(rest)))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
