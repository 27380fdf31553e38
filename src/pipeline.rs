//! End-to-end flowline enrichment
//!
//! [`enrich`] is the core step: it applies the path sampler once per
//! [`SamplingRequest`] and appends each result to the table in request order.
//! [`run`] drives a whole configured run: it loads each referenced dataset
//! once, enriches the flowline, derives the mass balance columns and selects
//! the configured regions. Nothing is written to disk here, so a failure at
//! any stage leaves no partial output behind.

use crate::config::RunConfig;
use crate::errors::{FlowlineError, Result};
use crate::flowline::FlowlineTable;
use crate::grid::LayerSet;
use crate::loader::{load_source, LoadOutcome};
use crate::region::{select_region, RegionSelection};
use crate::sampler::{sample_layer, SamplerOptions};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// One column to add: `layer` of `source`, sampled along the flowline
#[derive(Debug, Clone, Copy)]
pub struct SamplingRequest<'a> {
    pub source: &'a LayerSet,
    pub layer: &'a str,
    pub column: &'a str,
}

/// Sample every request along `table` and return the enriched table
///
/// Columns are appended in request order. Reusing a column name replaces the
/// earlier values; the last request wins.
///
/// # Errors
///
/// Fails on the first request whose layer is missing or whose axes cannot
/// support the interpolation.
pub fn enrich(
    mut table: FlowlineTable,
    requests: &[SamplingRequest<'_>],
    options: &SamplerOptions,
) -> Result<FlowlineTable> {
    for request in requests {
        let values = sample_layer(
            request.source,
            request.layer,
            table.easting(),
            table.northing(),
            options,
        )?;
        if table.has_column(request.column) {
            warn!("Column '{}' already exists and is replaced", request.column);
        }
        debug!(
            "Sampled layer '{}' into column '{}' ({} points)",
            request.layer,
            request.column,
            values.len()
        );
        table.set_column(request.column, values)?;
    }
    Ok(table)
}

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: FlowlineTable,
    /// Selections in configuration order, keyed by region name
    pub regions: Vec<(String, RegionSelection)>,
    /// Datasets whose gap filling left sentinel cells, with the cell count
    pub degraded: Vec<(String, usize)>,
}

/// Run a configured extraction
///
/// # Errors
///
/// Propagates the first loading, sampling or table error. A sample that
/// references a dataset of an unsupported family fails with
/// [`FlowlineError::Config`].
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let table = FlowlineTable::read_csv(&config.flowline)?;
    info!(
        "Loaded flowline with {} points from {}",
        table.len(),
        config.flowline.display()
    );

    let mut sources: BTreeMap<&str, LayerSet> = BTreeMap::new();
    let mut degraded = Vec::new();
    for name in config.referenced_datasets() {
        let dataset = config.datasets.get(name).ok_or_else(|| {
            FlowlineError::config(format!("dataset '{name}' is not declared"))
        })?;
        let layers = match load_source(&dataset.path, &dataset.format, &config.gap_fill)? {
            LoadOutcome::Loaded(layers) => layers,
            LoadOutcome::Degraded {
                layers,
                residual_cells,
            } => {
                degraded.push((name.to_string(), residual_cells));
                layers
            }
            LoadOutcome::Empty { family } => {
                return Err(FlowlineError::config(format!(
                    "dataset '{name}' has unsupported family '{family}' but is sampled"
                )))
            }
        };
        sources.insert(name, layers);
    }

    let mut requests = Vec::with_capacity(config.samples.len());
    for sample in &config.samples {
        let source = sources.get(sample.dataset.as_str()).ok_or_else(|| {
            FlowlineError::config(format!("dataset '{}' was not loaded", sample.dataset))
        })?;
        requests.push(SamplingRequest {
            source,
            layer: &sample.layer,
            column: &sample.column,
        });
    }

    let mut table = enrich(table, &requests, &config.spline)?;
    if let Some(names) = &config.mass_balance {
        table.derive_mass_balance(names)?;
    }

    let regions = config
        .regions
        .iter()
        .map(|region| {
            let selection = select_region(&table, &region.bbox);
            debug!(
                "Region '{}' holds {} flowline points",
                region.name,
                selection.len()
            );
            (region.name.clone(), selection)
        })
        .collect();

    info!(
        "Enriched flowline with {} sampled columns",
        config.samples.len()
    );
    Ok(RunReport {
        table,
        regions,
        degraded,
    })
}
