//! Defines command-line interface options using `clap` for the flowline extractor.

use clap::Parser;
use std::path::PathBuf;

/// Sample GeoTIFF and NetCDF grids along a glacier flowline
#[derive(Parser, Debug)]
#[command(
    name = "flowline_extract",
    version,
    about = "Sample gridded datasets along a glacier flowline into a CSV profile"
)]
pub struct Args {
    /// Path to the JSON run configuration
    #[arg(short, long)]
    pub config: PathBuf,

    /// CSV output path. Overrides the configured output.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write the enriched table as NetCDF to this path
    #[arg(long)]
    pub output_netcdf: Option<PathBuf>,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// Enable verbose output.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
