//! Option schema type definitions.
//!
//! An [`OptionsSchema`] describes how the logical options of a wrapped
//! command map onto literal command-line flags. Schemas are usually written
//! by hand in YAML or JSON and round-trip through [`serde`] with their entry
//! order preserved, because entry order is argument order.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Runtime option values keyed by logical option name.
///
/// Keys missing from the map, and keys mapped to `null`, count as absent.
pub type Options = serde_json::Map<String, serde_json::Value>;

/// How a single rule encodes an option value onto the command line.
///
/// Serialized as `"array"`, `"boolean"`, `"inverted-boolean"` or `"string"`.
/// Any other type name is read as [`Passthrough`](OptionKind::Passthrough),
/// the fallback encoding for plain valued options.
///
/// # Examples
///
/// ```
/// use argv_shim_core::OptionKind;
///
/// let kind: OptionKind = serde_json::from_str("\"inverted-boolean\"").unwrap();
/// assert_eq!(kind, OptionKind::InvertedBoolean);
///
/// let fallback: OptionKind = serde_json::from_str("\"number\"").unwrap();
/// assert_eq!(fallback, OptionKind::Passthrough);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OptionKind {
    /// One `param value` pair per element of a sequence value.
    Array,
    /// Bare `param` when the value is `true`.
    Boolean,
    /// Bare `param` when the value is `false`.
    InvertedBoolean,
    /// `param value` with the value passed through as-is (the default).
    #[default]
    Passthrough,
}

impl OptionKind {
    /// Returns the serialized type name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Array => "array",
            Self::Boolean => "boolean",
            Self::InvertedBoolean => "inverted-boolean",
            Self::Passthrough => "string",
        }
    }
}

impl From<String> for OptionKind {
    fn from(name: String) -> Self {
        match name.as_str() {
            "array" => Self::Array,
            "boolean" => Self::Boolean,
            "inverted-boolean" => Self::InvertedBoolean,
            _ => Self::Passthrough,
        }
    }
}

impl From<OptionKind> for String {
    fn from(kind: OptionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single encoding rule: the literal flag and how to encode the value.
///
/// # Examples
///
/// ```
/// use argv_shim_core::{OptionKind, OptionRule};
///
/// let rule = OptionRule::array("--tag");
/// assert_eq!(rule.param, "--tag");
/// assert_eq!(rule.kind, OptionKind::Array);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRule {
    /// Flag emitted on the command line, including dashes (e.g. `--org`).
    pub param: String,
    /// Value encoding.
    #[serde(rename = "type", default)]
    pub kind: OptionKind,
}

impl OptionRule {
    pub fn new(param: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            param: param.into(),
            kind,
        }
    }

    pub fn array(param: impl Into<String>) -> Self {
        Self::new(param, OptionKind::Array)
    }

    pub fn boolean(param: impl Into<String>) -> Self {
        Self::new(param, OptionKind::Boolean)
    }

    pub fn inverted_boolean(param: impl Into<String>) -> Self {
        Self::new(param, OptionKind::InvertedBoolean)
    }

    pub fn string(param: impl Into<String>) -> Self {
        Self::new(param, OptionKind::Passthrough)
    }
}

/// A logical option and the rules applied to its value, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OptionEntry {
    name: String,
    rules: Vec<OptionRule>,
}

/// Ordered mapping from logical option name to encoding rules.
///
/// Use [`with_rule`](Self::with_rule) to build a schema in code. Adding a
/// rule for a name that already exists appends to that entry, so the entry
/// keeps its first position.
///
/// # Examples
///
/// ```
/// use argv_shim_core::{OptionRule, OptionsSchema};
///
/// let schema = OptionsSchema::new()
///     .with_rule("tags", OptionRule::array("--tag"))
///     .with_rule("finalize", OptionRule::boolean("--finalize"))
///     .with_rule("finalize", OptionRule::boolean("--wait"));
///
/// assert_eq!(schema.len(), 2);
/// assert_eq!(schema.get("finalize").unwrap().len(), 2);
/// assert_eq!(schema.option_names(), vec!["tags", "finalize"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsSchema {
    entries: Vec<OptionEntry>,
}

impl OptionsSchema {
    /// Creates an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule for `name` and returns the schema.
    pub fn with_rule(mut self, name: impl Into<String>, rule: OptionRule) -> Self {
        self.push_rule(name, rule);
        self
    }

    /// Adds a rule for `name`, appending to an existing entry if present.
    pub fn push_rule(&mut self, name: impl Into<String>, rule: OptionRule) {
        let name = name.into();
        match self.entries.iter_mut().find(|entry| entry.name == name) {
            Some(entry) => entry.rules.push(rule),
            None => self.entries.push(OptionEntry {
                name,
                rules: vec![rule],
            }),
        }
    }

    /// Returns the rules declared for `name`.
    pub fn get(&self, name: &str) -> Option<&[OptionRule]> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.rules.as_slice())
    }

    /// Iterates entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[OptionRule])> {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), entry.rules.as_slice()))
    }

    pub fn option_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for OptionsSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.rules)?;
        }
        map.end()
    }
}

/// A rule list as written in a document: one rule object or a sequence.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleList {
    One(OptionRule),
    Many(Vec<OptionRule>),
}

impl From<RuleList> for Vec<OptionRule> {
    fn from(list: RuleList) -> Self {
        match list {
            RuleList::One(rule) => vec![rule],
            RuleList::Many(rules) => rules,
        }
    }
}

struct OptionsSchemaVisitor;

impl<'de> Visitor<'de> for OptionsSchemaVisitor {
    type Value = OptionsSchema;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map from option name to one or more option rules")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let capacity = access.size_hint().unwrap_or(0).min(64);
        let mut entries: Vec<OptionEntry> = Vec::with_capacity(capacity);
        while let Some((name, rules)) = access.next_entry::<String, RuleList>()? {
            if entries.iter().any(|entry| entry.name == name) {
                return Err(de::Error::custom(format!("duplicate option `{name}`")));
            }
            entries.push(OptionEntry {
                name,
                rules: rules.into(),
            });
        }
        Ok(OptionsSchema { entries })
    }
}

impl<'de> Deserialize<'de> for OptionsSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(OptionsSchemaVisitor)
    }
}
