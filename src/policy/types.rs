//! Policy document types
//!
//! These mirror policy-bot's `.policy.yml` schema. Fields the generator never
//! produces (`options`, `requires.count`, other predicates) are kept as opaque
//! YAML so that an override document survives a merge unchanged.

use crate::error::PolicyError;
use regex::Regex;
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Read;

/// A complete policy document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyDocument {
    #[serde(default)]
    pub policy: Policy,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approval_rules: Vec<ApprovalRule>,
}

/// The `policy` section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Top-level alternative sets. Each entry is a combinator expression.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub approval: Vec<ApprovalExpr>,

    /// At most one disapproval policy, passed through opaquely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disapproval: Option<Value>,
}

/// Combinator expression whose leaves are approval rule names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalExpr {
    Rule(String),
    And(Vec<ApprovalExpr>),
    Or(Vec<ApprovalExpr>),
}

impl ApprovalExpr {
    pub fn rule(name: impl Into<String>) -> Self {
        ApprovalExpr::Rule(name.into())
    }

    /// Every rule name referenced by this expression, in order of appearance
    pub fn rule_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, into: &mut Vec<&'a str>) {
        match self {
            ApprovalExpr::Rule(name) => into.push(name),
            ApprovalExpr::And(items) | ApprovalExpr::Or(items) => {
                for item in items {
                    item.collect_names(into);
                }
            }
        }
    }
}

impl Serialize for ApprovalExpr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (key, items) = match self {
            ApprovalExpr::Rule(name) => return serializer.serialize_str(name),
            ApprovalExpr::And(items) => ("and", items),
            ApprovalExpr::Or(items) => ("or", items),
        };
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(key, items)?;
        map.end()
    }
}

struct ApprovalExprVisitor;

impl<'de> Visitor<'de> for ApprovalExprVisitor {
    type Value = ApprovalExpr;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a rule name or a map with a single `and` or `or` key")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ApprovalExpr::Rule(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ApprovalExpr::Rule(v))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::invalid_length(0, &self));
        };
        let expr = match key.as_str() {
            "and" => ApprovalExpr::And(map.next_value()?),
            "or" => ApprovalExpr::Or(map.next_value()?),
            other => return Err(de::Error::unknown_field(other, &["and", "or"])),
        };
        if map.next_key::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(2, &self));
        }
        Ok(expr)
    }
}

impl<'de> Deserialize<'de> for ApprovalExpr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ApprovalExprVisitor)
    }
}

/// A named, independently referenceable gating condition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApprovalRule {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// When the rule applies
    #[serde(rename = "if", default, skip_serializing_if = "Predicates::is_empty")]
    pub predicates: Predicates,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    #[serde(default, skip_serializing_if = "Requires::is_empty")]
    pub requires: Requires,
}

impl ApprovalRule {
    /// A bare rule with no predicates or requirements
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Predicate set used by both `if` and `requires.conditions`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<ChangedFiles>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_workflow_result: Option<HasWorkflowResult>,

    /// Predicates the generator does not interpret
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Predicates {
    pub fn is_empty(&self) -> bool {
        self.changed_files.is_none() && self.has_workflow_result.is_none() && self.other.is_empty()
    }
}

/// The `requires` block of an approval rule
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requires {
    #[serde(default, skip_serializing_if = "Predicates::is_empty")]
    pub conditions: Predicates,

    /// `count`, `users`, `teams` and other approver requirements
    #[serde(flatten)]
    pub other: BTreeMap<String, Value>,
}

impl Requires {
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty() && self.other.is_empty()
    }
}

/// Anchored path regex as it appears on the wire
#[derive(Debug, Clone)]
pub struct PathRegex(Regex);

impl PathRegex {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.0.is_match(path)
    }
}

impl PartialEq for PathRegex {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for PathRegex {}

impl Serialize for PathRegex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PathRegex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        PathRegex::new(&pattern).map_err(de::Error::custom)
    }
}

/// Rule applies when a changed file matches `paths` and not `ignore`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFiles {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<PathRegex>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<PathRegex>,
}

impl ChangedFiles {
    /// Whether any changed file triggers the predicate, as policy-bot
    /// evaluates it.
    ///
    /// Ignored files never count, and a file must match one of `paths`: with
    /// no `paths` nothing matches.
    pub fn matches<S: AsRef<str>>(&self, changed: &[S]) -> bool {
        changed.iter().map(AsRef::as_ref).any(|file| {
            !self.ignore.iter().any(|re| re.is_match(file))
                && self.paths.iter().any(|re| re.is_match(file))
        })
    }
}

/// Outcome of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Conclusion {
    ActionRequired,
    Cancelled,
    Failure,
    Neutral,
    Skipped,
    Stale,
    Success,
    TimedOut,
}

/// Requires the named workflows to have finished with one of `conclusions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HasWorkflowResult {
    #[serde(default)]
    pub conclusions: Vec<Conclusion>,

    #[serde(default)]
    pub workflows: Vec<String>,
}

impl HasWorkflowResult {
    /// Whether a run of `workflow` ending in `conclusion` satisfies the predicate
    pub fn accepts(&self, workflow: &str, conclusion: Conclusion) -> bool {
        self.workflows.iter().any(|w| w == workflow) && self.conclusions.contains(&conclusion)
    }
}

impl PolicyDocument {
    /// Parse a user-authored policy document.
    ///
    /// Input holding no YAML document at all (empty, or only comments) is
    /// rejected rather than read as an empty policy.
    pub fn from_reader(reader: impl Read) -> Result<Self, PolicyError> {
        let value: Value = serde_yaml::from_reader(reader).map_err(PolicyError::InvalidOverride)?;
        Self::from_value(value)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let value: Value = serde_yaml::from_str(yaml).map_err(PolicyError::InvalidOverride)?;
        Self::from_value(value)
    }

    fn from_value(value: Value) -> Result<Self, PolicyError> {
        if value.is_null() {
            return Err(PolicyError::InvalidOverride(de::Error::custom(
                "no policy document found",
            )));
        }
        serde_yaml::from_value(value).map_err(PolicyError::InvalidOverride)
    }

    pub fn to_yaml(&self) -> Result<String, PolicyError> {
        serde_yaml::to_string(self).map_err(PolicyError::Serialize)
    }

    /// Look up a rule by name
    pub fn rule(&self, name: &str) -> Option<&ApprovalRule> {
        self.approval_rules.iter().find(|rule| rule.name == name)
    }

    /// Rule names referenced from `policy.approval` that no rule defines
    pub fn undefined_rule_references(&self) -> Vec<String> {
        let defined: BTreeSet<&str> = self.approval_rules.iter().map(|r| r.name.as_str()).collect();
        let mut missing = Vec::new();
        for name in self.policy.approval.iter().flat_map(ApprovalExpr::rule_names) {
            if !defined.contains(name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        missing
    }
}
