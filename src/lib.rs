//! flowline_extract: sample gridded glacier datasets along a flowline
//!
//! Loads single-band GeoTIFF rasters and family-mapped NetCDF grids, fills raster
//! holes by Gaussian smoothing, samples layers along a flowline with bivariate
//! spline interpolation and assembles the results into a flowline table that is
//! written as CSV (and optionally NetCDF).
//!
//! ## Module Organization
//!
//! - [`grid`]: coordinate axes, geotransforms and named layer sets
//! - [`loader`]: GeoTIFF and NetCDF loading into layer sets
//! - [`gap_fill`]: Gaussian gap filling of NaN holes
//! - [`spline`]: one- and two-dimensional interpolating splines
//! - [`sampler`]: grid orientation and path sampling
//! - [`flowline`]: the flowline table, its CSV form and derived columns
//! - [`region`]: bounding-box selection along the flowline
//! - [`config`]: JSON run configuration
//! - [`pipeline`]: table enrichment and whole-run orchestration
//! - [`netcdf_io`]: NetCDF export of the table
//! - [`parallel`]: parallel processing configuration
//! - [`errors`]: centralized error handling
//!
//! ## Usage
//!
//! ```rust,no_run
//! use flowline_extract::prelude::*;
//! use std::path::Path;
//!
//! let config = RunConfig::from_path(Path::new("config/lake_europa.json")).unwrap();
//! let report = run(&config).unwrap();
//! report.table.write_csv(&config.output).unwrap();
//! ```

pub mod config;
pub mod errors;
pub mod flowline;
pub mod gap_fill;
pub mod grid;
pub mod loader;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod region;
pub mod sampler;
pub mod spline;

pub use errors::{FlowlineError, Result};

pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::config::RunConfig;
    pub use crate::errors::{FlowlineError, Result};
    pub use crate::flowline::{FlowlinePoint, FlowlineTable, MassBalanceColumns};
    pub use crate::gap_fill::{fill_gaps, FillOutcome, GapFillOptions};
    pub use crate::grid::{LayerSet, SENTINEL};
    pub use crate::loader::{load_geotiff, load_netcdf, load_source, LoadOutcome, SourceFormat};
    pub use crate::netcdf_io::FlowlineNetcdfWriter;
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{enrich, run, RunReport, SamplingRequest};
    pub use crate::region::{select_region, BoundingBox, RegionSelection};
    pub use crate::sampler::{sample_layer, SamplerOptions};
    pub use crate::spline::{Extrapolation, SplineDegree};
}
