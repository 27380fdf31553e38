//! Entry point for the flowline extractor.
//! Handles CLI parsing, logging and thread pool setup, then runs the configured
//! extraction and writes the enriched profile.

use clap::Parser;
use flowline_extract::config::RunConfig;
use flowline_extract::netcdf_io::FlowlineNetcdfWriter;
use flowline_extract::parallel::{get_parallel_info, ParallelConfig};
use flowline_extract::pipeline;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Args;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    ParallelConfig::new(args.threads).setup_global_pool()?;
    get_parallel_info().log();

    let mut config = RunConfig::from_path(&args.config)?;
    if let Some(output) = args.output {
        config.output = output;
    }

    let report = pipeline::run(&config)?;

    report.table.write_csv(&config.output)?;
    println!(
        "✅ Saved {} points x {} columns to {}",
        report.table.len(),
        report.table.column_names().count(),
        config.output.display()
    );

    if let Some(path) = &args.output_netcdf {
        FlowlineNetcdfWriter::new(&report.table, path).write()?;
        println!("✅ Saved NetCDF profile to {}", path.display());
    }

    for (name, cells) in &report.degraded {
        println!("⚠ {name}: {cells} cells left at the sentinel after gap filling");
    }

    for (name, selection) in &report.regions {
        match selection.distance_span() {
            Some((start, end)) => println!(
                "{name}: {} points, distance {start} to {end}",
                selection.len()
            ),
            None => println!("{name}: no flowline points inside"),
        }
    }

    Ok(())
}
