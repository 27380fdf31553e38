//! Loading GeoTIFF and NetCDF sources into layer sets
//!
//! # Organization
//!
//! - [`geotiff`]: single-band rasters, georeferenced from GeoTIFF tags and
//!   gap filled on load
//! - [`netcdf`]: multi-variable NetCDF files read through a fixed variable
//!   mapping per data family
//!
//! Both loaders return a [`LoadOutcome`] so callers can tell a clean load from
//! one that needed sentinel cells or one that produced no layers at all.

pub mod geotiff;
pub mod netcdf;

pub use self::geotiff::{load_geotiff, read_geotiff, FILLED_LAYER, RAW_LAYER};
pub use self::netcdf::{load_netcdf, DataFamily};

use crate::errors::Result;
use crate::gap_fill::GapFillOptions;
use crate::grid::LayerSet;
use serde::Deserialize;
use std::path::Path;

/// On-disk format of a dataset
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum SourceFormat {
    /// Single-band GeoTIFF raster
    Geotiff,
    /// NetCDF file with a declared data family tag
    Netcdf { family: String },
}

/// Result of loading one source file
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// All layers loaded
    Loaded(LayerSet),
    /// Layers loaded, but gap filling left cells set to the sentinel
    Degraded { layers: LayerSet, residual_cells: usize },
    /// The data family is not supported; nothing was read
    Empty { family: String },
}

impl LoadOutcome {
    pub fn layers(&self) -> Option<&LayerSet> {
        match self {
            Self::Loaded(layers) | Self::Degraded { layers, .. } => Some(layers),
            Self::Empty { .. } => None,
        }
    }

    pub fn into_layers(self) -> Option<LayerSet> {
        match self {
            Self::Loaded(layers) | Self::Degraded { layers, .. } => Some(layers),
            Self::Empty { .. } => None,
        }
    }
}

/// Load a source according to its declared format
pub fn load_source(
    path: &Path,
    format: &SourceFormat,
    gap_fill: &GapFillOptions,
) -> Result<LoadOutcome> {
    match format {
        SourceFormat::Geotiff => load_geotiff(path, gap_fill),
        SourceFormat::Netcdf { family } => load_netcdf(path, family),
    }
}
