//! Workflow definition types
//!
//! A workflow's `on` key can be written three ways:
//!
//! ```yaml
//! on: pull_request
//! on: [push, pull_request]
//! on:
//!   pull_request:
//!     paths: ["src/**"]
//! ```
//!
//! All three are normalized once, at parse time, into [`Triggers`]: a map of
//! trigger name to [`TriggerDetail`]. Nothing downstream looks at the wire form.

use crate::error::WorkflowError;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;

/// `pull_request` trigger name
pub const PULL_REQUEST: &str = "pull_request";

/// `pull_request_target` trigger name
pub const PULL_REQUEST_TARGET: &str = "pull_request_target";

/// Activity type fired when new commits are pushed to a pull request
pub const SYNCHRONIZE: &str = "synchronize";

/// Activity types a pull request trigger runs on when `types` is omitted
pub const DEFAULT_PULL_REQUEST_TYPES: &[&str] = &["opened", SYNCHRONIZE, "reopened"];

/// Whether a trigger name belongs to the pull request family
pub fn is_pull_request_trigger(name: &str) -> bool {
    name == PULL_REQUEST || name == PULL_REQUEST_TARGET
}

/// Canonical trigger map, ordered by trigger name
pub type Triggers = BTreeMap<String, TriggerDetail>;

/// Filters attached to a single trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerDetail {
    pub paths: Vec<String>,
    pub paths_ignore: Vec<String>,
    pub branches: Vec<String>,
    pub branches_ignore: Vec<String>,
    /// Activity types. Already defaulted for pull request triggers.
    pub types: Vec<String>,
}

impl TriggerDetail {
    /// Detail for a pull request trigger declared without any filters
    pub fn pull_request_default() -> Self {
        Self {
            types: DEFAULT_PULL_REQUEST_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            ..Default::default()
        }
    }

    /// Whether this trigger fires on the given activity type
    pub fn runs_on(&self, activity: &str) -> bool {
        self.types.iter().any(|t| t == activity)
    }
}

/// Parsed representation of one workflow file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowDefinition {
    /// Display name from the workflow's `name` key
    pub name: Option<String>,
    pub on: Triggers,
}

/// Combined path scoping of a workflow's pull request triggers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathScope {
    pub paths: Vec<String>,
    pub paths_ignore: Vec<String>,
}

impl PathScope {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty() && self.paths_ignore.is_empty()
    }
}

impl WorkflowDefinition {
    /// Parse a workflow from YAML bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, WorkflowError> {
        let wire: WireWorkflow = serde_yaml::from_slice(bytes)?;
        Ok(Self {
            name: wire.name,
            on: normalize_triggers(wire.on)?,
        })
    }

    /// Build a definition from an already-canonical trigger map
    pub fn with_triggers(on: Triggers) -> Self {
        Self { name: None, on }
    }

    /// The `pull_request` and `pull_request_target` triggers, in that order
    pub fn pull_request_triggers(&self) -> impl Iterator<Item = (&str, &TriggerDetail)> {
        self.on
            .iter()
            .filter(|(name, _)| is_pull_request_trigger(name))
            .map(|(name, detail)| (name.as_str(), detail))
    }

    /// Union of `paths` and `paths-ignore` across all pull request triggers.
    ///
    /// Globs keep their first-seen order; a glob declared by both triggers
    /// appears once.
    pub fn path_scope(&self) -> PathScope {
        let mut scope = PathScope::default();
        for (_, detail) in self.pull_request_triggers() {
            extend_unique(&mut scope.paths, &detail.paths);
            extend_unique(&mut scope.paths_ignore, &detail.paths_ignore);
        }
        scope
    }
}

fn extend_unique(into: &mut Vec<String>, from: &[String]) {
    for item in from {
        if !into.contains(item) {
            into.push(item.clone());
        }
    }
}

#[derive(Deserialize)]
struct WireWorkflow {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    on: Value,
}

/// GitHub accepts a bare string anywhere a list of strings is expected
#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl From<StringOrList> for Vec<String> {
    fn from(value: StringOrList) -> Self {
        match value {
            StringOrList::One(s) => vec![s],
            StringOrList::Many(v) => v,
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "kebab-case")]
struct WireTriggerDetail {
    paths: Option<StringOrList>,
    paths_ignore: Option<StringOrList>,
    branches: Option<StringOrList>,
    branches_ignore: Option<StringOrList>,
    types: Option<StringOrList>,
}

impl From<WireTriggerDetail> for TriggerDetail {
    fn from(wire: WireTriggerDetail) -> Self {
        let types = match wire.types {
            Some(types) => types.into(),
            None => TriggerDetail::pull_request_default().types,
        };
        Self {
            paths: wire.paths.map(Into::into).unwrap_or_default(),
            paths_ignore: wire.paths_ignore.map(Into::into).unwrap_or_default(),
            branches: wire.branches.map(Into::into).unwrap_or_default(),
            branches_ignore: wire.branches_ignore.map(Into::into).unwrap_or_default(),
            types,
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "list",
        Value::Mapping(_) => "map",
        Value::Tagged(_) => "tagged value",
    }
}

fn bare_trigger(name: String) -> (String, TriggerDetail) {
    let detail = if is_pull_request_trigger(&name) {
        TriggerDetail::pull_request_default()
    } else {
        TriggerDetail::default()
    };
    (name, detail)
}

/// Normalize the wire form of `on` into the canonical trigger map.
///
/// Only pull request trigger details are interpreted; other triggers (e.g.
/// `schedule`, whose detail is a list) are recorded by name only.
fn normalize_triggers(on: Value) -> Result<Triggers, WorkflowError> {
    match on {
        Value::Null => Ok(Triggers::new()),
        Value::String(name) => Ok(Triggers::from([bare_trigger(name)])),
        Value::Sequence(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(bare_trigger(name)),
                other => Err(WorkflowError::unexpected_shape(format!(
                    "list containing {}",
                    value_kind(&other)
                ))),
            })
            .collect(),
        Value::Mapping(map) => {
            let mut triggers = Triggers::new();
            for (key, detail) in map {
                let name = match key {
                    Value::String(name) => name,
                    other => {
                        return Err(WorkflowError::unexpected_shape(format!(
                            "map with {} key",
                            value_kind(&other)
                        )));
                    }
                };
                if !is_pull_request_trigger(&name) {
                    triggers.insert(name, TriggerDetail::default());
                    continue;
                }
                let detail = match detail {
                    Value::Null => TriggerDetail::pull_request_default(),
                    Value::Mapping(_) => {
                        serde_yaml::from_value::<WireTriggerDetail>(detail)?.into()
                    }
                    other => {
                        return Err(WorkflowError::unexpected_shape(format!(
                            "{} for `{}` detail",
                            value_kind(&other),
                            name
                        )));
                    }
                };
                triggers.insert(name, detail);
            }
            Ok(triggers)
        }
        other => Err(WorkflowError::unexpected_shape(value_kind(&other))),
    }
}
