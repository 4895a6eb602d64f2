//! Run configuration shared by all jobs of a run.
use crate::core::Bounds;
use crate::error::Result;

use num_traits::Float;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Parameters of a run, read from a JSON file. Missing fields take their default values.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Seed from which the seeds of all jobs are derived.
    pub base_seed: u64,
    /// Number of samples per job, or in total for a reduction.
    pub samples: usize,
    /// Integration domain, written as `[(low, high), ...]`.
    pub bounds: String,
    /// Directory that receives the artifacts.
    pub results_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            base_seed: 42,
            samples: 100_000,
            bounds: "[(-1, 1), (-1, 1)]".to_string(),
            results_dir: PathBuf::from("results"),
        }
    }
}

impl RunConfig {
    /// Reads the configuration from the JSON file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    /// Parses and validates the configured bounds.
    pub fn bounds<T: Float + FromStr>(&self) -> Result<Bounds<T>> {
        self.bounds.parse()
    }
}
