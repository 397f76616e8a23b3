use std::path::Path;

use oxiclass_engine::{LcsParameters, RunSeed};
use oxiclass_training::compaction::CompactionMethod;
use serde::{Deserialize, Serialize};

use crate::util;

/// JSON run configuration: learning parameters flattened alongside the run
/// seed and the compaction override.
///
/// Every field is optional; an empty object yields the default run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    #[serde(flatten)]
    pub params: LcsParameters,
    pub seed: Option<RunSeed>,
    pub compaction: Option<CompactionMethod>,
}

impl RunConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => util::read_json_file("run configuration", path),
            None => Ok(Self::default()),
        }
    }
}
