//! # Properties
//!
//! The project's name/value store. Values live in one of three tiers and are
//! read through a merged view where `User` beats `Inherited` beats `Plain`.
//! `${name}` tokens are expanded at read time by [`PropertyTable::replace_properties`].

use crate::core::error::{BuildError, BuildResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

lazy_static! {
    // `$$` is an escaped dollar, `${...}` a reference, and a bare `${` that never
    // closes is a syntax error. A lone `$` matches nothing and stays literal.
    static ref PROPERTY_TOKEN_RE: Regex = Regex::new(r"\$\$|\$\{([^}]*)\}|\$\{").unwrap();
}

/// The write tier a property value belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyTier {
    /// Set by the build description. First write wins.
    Plain,
    /// Set by the environment or a parent build at init time.
    Inherited,
    /// Set from the command line or an explicit user API call.
    User,
}

/// What happened to a write request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The value was stored.
    Written,
    /// A plain write was dropped because a user or inherited value already exists.
    ShadowedByUser,
    /// A plain write was dropped because a plain value already exists.
    AlreadySet,
}

/// One piece of a parsed property string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Literal text, with `$$` escapes already collapsed.
    Literal(String),
    /// The name inside a `${...}` token.
    Reference(String),
}

/// Three-tier property storage.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    plain: HashMap<String, String>,
    inherited: HashMap<String, String>,
    user: HashMap<String, String>,
}

impl PropertyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` under `name` honouring tier precedence.
    ///
    /// `User` and `Inherited` writes always land in their tier. A `Plain` write is
    /// ignored when the name already exists in any tier, unless `override_allowed`
    /// is set, in which case it replaces the value in the highest tier holding it.
    pub fn set_property(
        &mut self,
        name: &str,
        value: &str,
        tier: PropertyTier,
        override_allowed: bool,
    ) -> SetOutcome {
        match tier {
            PropertyTier::User => {
                self.user.insert(name.to_string(), value.to_string());
            }
            PropertyTier::Inherited => {
                self.inherited.insert(name.to_string(), value.to_string());
            }
            PropertyTier::Plain if override_allowed => {
                let slot = if let Some(v) = self.user.get_mut(name) {
                    v
                } else if let Some(v) = self.inherited.get_mut(name) {
                    v
                } else {
                    self.plain.entry(name.to_string()).or_default()
                };
                *slot = value.to_string();
            }
            PropertyTier::Plain => {
                if self.user.contains_key(name) || self.inherited.contains_key(name) {
                    return SetOutcome::ShadowedByUser;
                }
                if self.plain.contains_key(name) {
                    return SetOutcome::AlreadySet;
                }
                self.plain.insert(name.to_string(), value.to_string());
            }
        }
        SetOutcome::Written
    }

    /// Returns the merged value of `name`, highest tier first.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.user
            .get(name)
            .or_else(|| self.inherited.get(name))
            .or_else(|| self.plain.get(name))
            .map(String::as_str)
    }

    /// Returns `true` if `name` is set in any tier.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the value stored in one specific tier.
    pub fn get_in_tier(&self, name: &str, tier: PropertyTier) -> Option<&str> {
        self.tier(tier).get(name).map(String::as_str)
    }

    /// Read access to a single tier.
    pub fn tier(&self, tier: PropertyTier) -> &HashMap<String, String> {
        match tier {
            PropertyTier::Plain => &self.plain,
            PropertyTier::Inherited => &self.inherited,
            PropertyTier::User => &self.user,
        }
    }

    /// The merged view as a sorted map, suitable for listings.
    pub fn merged(&self) -> BTreeMap<String, String> {
        let mut merged = BTreeMap::new();
        for tier in [&self.plain, &self.inherited, &self.user] {
            for (k, v) in tier {
                merged.insert(k.clone(), v.clone());
            }
        }
        merged
    }

    /// Expands every `${name}` token in `text` against the merged view.
    ///
    /// Unknown names are left verbatim. Returns an error only for an unclosed `${`.
    pub fn replace_properties(&self, text: &str) -> BuildResult<String> {
        if !text.contains('$') {
            return Ok(text.to_string());
        }
        let fragments = parse_property_string(text)?;
        Ok(render_fragments(&fragments, |name| self.get(name)))
    }
}

/// Splits `text` into literal and reference fragments.
///
/// Adjacent literals are merged, so the output alternates between the two kinds
/// wherever possible.
pub fn parse_property_string(text: &str) -> BuildResult<Vec<Fragment>> {
    let mut fragments = Vec::new();
    let mut last_index = 0;

    for caps in PROPERTY_TOKEN_RE.captures_iter(text) {
        let Some(full_match) = caps.get(0) else {
            continue;
        };
        push_literal(&mut fragments, text.get(last_index..full_match.start()).unwrap_or(""));

        match (full_match.as_str(), caps.get(1)) {
            ("$$", _) => push_literal(&mut fragments, "$"),
            (_, Some(name)) => fragments.push(Fragment::Reference(name.as_str().to_string())),
            _ => {
                return Err(BuildError::UnclosedPropertyToken {
                    text: text.to_string(),
                });
            }
        }
        last_index = full_match.end();
    }

    push_literal(&mut fragments, text.get(last_index..).unwrap_or(""));
    Ok(fragments)
}

/// Joins fragments back into a string, looking references up through `lookup`.
/// References `lookup` cannot answer are written back as `${name}`.
pub fn render_fragments<'a, F>(fragments: &[Fragment], lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Literal(s) => out.push_str(s),
            Fragment::Reference(name) => match lookup(name) {
                Some(value) => out.push_str(value),
                None => {
                    log::trace!("Property '{}' has not been set", name);
                    out.push_str("${");
                    out.push_str(name);
                    out.push('}');
                }
            },
        }
    }
    out
}

fn push_literal(fragments: &mut Vec<Fragment>, s: &str) {
    if s.is_empty() {
        return;
    }
    if let Some(Fragment::Literal(last)) = fragments.last_mut() {
        last.push_str(s);
    } else {
        fragments.push(Fragment::Literal(s.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_property_beats_plain_and_resists_plain_writes() {
        let mut table = PropertyTable::new();
        table.set_property("name", "v1", PropertyTier::Plain, false);
        table.set_property("name", "v2", PropertyTier::User, false);
        assert_eq!(table.get("name"), Some("v2"));

        let outcome = table.set_property("name", "v3", PropertyTier::Plain, false);
        assert_eq!(outcome, SetOutcome::ShadowedByUser);
        assert_eq!(table.get("name"), Some("v2"));
    }

    #[test]
    fn test_plain_first_write_wins() {
        let mut table = PropertyTable::new();
        assert_eq!(
            table.set_property("a", "1", PropertyTier::Plain, false),
            SetOutcome::Written
        );
        assert_eq!(
            table.set_property("a", "2", PropertyTier::Plain, false),
            SetOutcome::AlreadySet
        );
        assert_eq!(table.get("a"), Some("1"));
    }

    #[test]
    fn test_override_replaces_highest_tier() {
        let mut table = PropertyTable::new();
        table.set_property("a", "user", PropertyTier::User, false);
        table.set_property("a", "forced", PropertyTier::Plain, true);
        assert_eq!(table.get("a"), Some("forced"));
        assert_eq!(table.get_in_tier("a", PropertyTier::User), Some("forced"));

        table.set_property("b", "1", PropertyTier::Plain, false);
        table.set_property("b", "2", PropertyTier::Plain, true);
        assert_eq!(table.get("b"), Some("2"));
    }

    #[test]
    fn test_inherited_sits_between_user_and_plain() {
        let mut table = PropertyTable::new();
        table.set_property("os", "plain", PropertyTier::Plain, false);
        table.set_property("os", "linux", PropertyTier::Inherited, false);
        assert_eq!(table.get("os"), Some("linux"));
        table.set_property("os", "cli", PropertyTier::User, false);
        assert_eq!(table.get("os"), Some("cli"));
    }

    #[test]
    fn test_replace_properties_resolves_and_keeps_unknown() {
        let mut table = PropertyTable::new();
        assert_eq!(
            table.replace_properties("Hello, ${user.name}!").unwrap(),
            "Hello, ${user.name}!"
        );
        table.set_property("user.name", "World", PropertyTier::Plain, false);
        assert_eq!(
            table.replace_properties("Hello, ${user.name}!").unwrap(),
            "Hello, World!"
        );
    }

    #[test]
    fn test_replace_properties_multiple_tokens_and_escapes() {
        let mut table = PropertyTable::new();
        table.set_property("a", "1", PropertyTier::Plain, false);
        table.set_property("b", "2", PropertyTier::Plain, false);
        assert_eq!(table.replace_properties("${a}+${b}=3").unwrap(), "1+2=3");
        assert_eq!(table.replace_properties("cost: $$5").unwrap(), "cost: $5");
        assert_eq!(table.replace_properties("$${a}").unwrap(), "${a}");
        assert_eq!(table.replace_properties("a $ b").unwrap(), "a $ b");
    }

    #[test]
    fn test_replace_properties_does_not_recurse_into_values() {
        let mut table = PropertyTable::new();
        table.set_property("inner", "x", PropertyTier::Plain, false);
        table.set_property("outer", "${inner}", PropertyTier::Plain, false);
        assert_eq!(table.replace_properties("${outer}").unwrap(), "${inner}");
    }

    #[test]
    fn test_unclosed_token_is_an_error() {
        let table = PropertyTable::new();
        let err = table.replace_properties("broken ${name").unwrap_err();
        assert!(matches!(err, BuildError::UnclosedPropertyToken { .. }));
    }

    #[test]
    fn test_parse_property_string_fragments() {
        let fragments = parse_property_string("pre ${x} $$ mid ${y}").unwrap();
        assert_eq!(
            fragments,
            vec![
                Fragment::Literal("pre ".to_string()),
                Fragment::Reference("x".to_string()),
                Fragment::Literal(" $ mid ".to_string()),
                Fragment::Reference("y".to_string()),
            ]
        );
    }
}
