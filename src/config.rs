//! Run configuration loaded from a JSON file
//!
//! A run names the flowline, the datasets to load, which layer of which
//! dataset fills which output column, and the regions to report. Relative
//! paths are resolved against the directory holding the configuration file.

use crate::errors::{ensure_exists, FlowlineError, Result};
use crate::flowline::MassBalanceColumns;
use crate::gap_fill::GapFillOptions;
use crate::loader::SourceFormat;
use crate::region::BoundingBox;
use crate::sampler::SamplerOptions;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default CSV output file name
pub const DEFAULT_OUTPUT: &str = "profile_data_lake_europa.csv";

/// One input dataset
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatasetConfig {
    pub path: PathBuf,
    #[serde(flatten)]
    pub format: SourceFormat,
}

/// One output column: `layer` of `dataset` sampled along the flowline
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SampleConfig {
    pub dataset: String,
    pub layer: String,
    pub column: String,
}

/// Named bounding box reported as a distance span
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    #[serde(flatten)]
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunConfig {
    /// Flowline CSV with distance, easting and northing columns
    pub flowline: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    pub datasets: BTreeMap<String, DatasetConfig>,
    #[serde(default)]
    pub samples: Vec<SampleConfig>,
    #[serde(default)]
    pub regions: Vec<RegionConfig>,
    #[serde(default)]
    pub gap_fill: GapFillOptions,
    #[serde(default)]
    pub spline: SamplerOptions,
    /// Derived mass balance columns; `null` turns the derivation off
    #[serde(default = "default_mass_balance")]
    pub mass_balance: Option<MassBalanceColumns>,
}

fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT)
}

fn default_mass_balance() -> Option<MassBalanceColumns> {
    Some(MassBalanceColumns::default())
}

impl RunConfig {
    /// Read, resolve and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::FileNotFound`] if the file is missing,
    /// [`FlowlineError::Json`] if it does not parse and
    /// [`FlowlineError::Config`] if it fails validation.
    pub fn from_path(path: &Path) -> Result<Self> {
        ensure_exists(path)?;
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        debug!(
            "Loaded configuration from {}: {} datasets, {} samples, {} regions",
            path.display(),
            config.datasets.len(),
            config.samples.len(),
            config.regions.len()
        );
        Ok(config)
    }

    /// Parse and validate a configuration without touching the filesystem
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Join relative input paths onto `base`; the output path is left alone
    pub fn resolve_paths(&mut self, base: &Path) {
        if self.flowline.is_relative() {
            self.flowline = base.join(&self.flowline);
        }
        for dataset in self.datasets.values_mut() {
            if dataset.path.is_relative() {
                dataset.path = base.join(&dataset.path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.gap_fill.iterations == 0 {
            return Err(FlowlineError::config(
                "gap_fill.iterations must be at least 1",
            ));
        }

        for sample in &self.samples {
            if !self.datasets.contains_key(&sample.dataset) {
                return Err(FlowlineError::config(format!(
                    "sample column '{}' references undeclared dataset '{}'",
                    sample.column, sample.dataset
                )));
            }
        }

        for region in &self.regions {
            let [w, s] = region.bbox.southwest;
            let [e, n] = region.bbox.northeast;
            if !(w < e && s < n) {
                warn!(
                    "Region '{}' south-west corner is not below and left of its north-east corner, it will select nothing",
                    region.name
                );
            }
        }
        Ok(())
    }

    /// Names of datasets referenced by at least one sample, in sample order
    pub fn referenced_datasets(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.samples
            .iter()
            .map(|s| s.dataset.as_str())
            .filter(|name| seen.insert(*name))
            .collect()
    }
}
