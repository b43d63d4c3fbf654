//! The immutable-after-load configuration tree.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::Deserializer;
use serde::Deserialize;

use crate::argument::Argument;
use crate::rate::Rate;

/// Top-level configuration: a mapping from workflow name to [`Workflow`],
/// and a mapping from activity name to [`Activity`]. Named `Drk` after
/// the struct of the same name in the tool this crate is built from.
#[derive(Clone, Debug, Deserialize)]
pub struct Drk {
    pub workflows: HashMap<String, Workflow>,
    pub activities: HashMap<String, Activity>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Workflow {
    pub vus: u32,
    #[serde(default)]
    pub setup_queries: Vec<String>,
    #[serde(default)]
    pub queries: Vec<WorkflowQuery>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WorkflowQuery {
    pub name: String,
    pub rate: Rate,
}

/// Called `Query` in the tool this crate is built from; renamed here to
/// avoid colliding with the `query` activity kind and the `query`
/// argument kind.
#[derive(Clone, Debug, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub query: String,
    #[serde(default)]
    pub args: Vec<Argument>,
}

/// An activity's dispatch kind. `Other` keeps unrecognized `type` values
/// around instead of rejecting them at parse time, so they can fail
/// with `UnsupportedQueryType` at the point they're actually dispatched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Query,
    Exec,
    Other(String),
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        // `anyhow::Result` is imported at module scope as `Result`, so the
        // fully-qualified path is used here to reach the plain two-generic one.
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "query" => ActivityKind::Query,
            "exec" => ActivityKind::Exec,
            _ => ActivityKind::Other(raw),
        })
    }
}

/// The reserved workflow name: executed to completion, single-VU,
/// before all others.
pub const INIT_WORKFLOW: &str = "init";

impl Drk {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("opening file: {}", path.display()))?;
        let cfg: Drk =
            serde_yaml::from_str(&contents).with_context(|| "parsing file".to_string())?;
        Ok(cfg)
    }
}
