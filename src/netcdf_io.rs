//! NetCDF export of an enriched flowline table
//!
//! Every table column becomes a one-dimensional `f64` variable over a shared
//! `point` dimension, in table order. Missing values are written as NaN and
//! declared through `_FillValue`.

use crate::errors::Result;
use crate::flowline::FlowlineTable;
use chrono::Utc;
use ndarray::aview1;
use netcdf::create;
use std::{fs, path::Path};
use tracing::info;

/// Dimension shared by every exported column
pub const POINT_DIM: &str = "point";

/// Writes a [`FlowlineTable`] to a new NetCDF file
pub struct FlowlineNetcdfWriter<'a> {
    table: &'a FlowlineTable,
    output_path: &'a Path,
}

impl<'a> FlowlineNetcdfWriter<'a> {
    pub fn new(table: &'a FlowlineTable, output_path: &'a Path) -> Self {
        Self { table, output_path }
    }

    /// Write the table, replacing any existing file at the output path
    pub fn write(&self) -> Result<()> {
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        let mut file = create(self.output_path)?;
        file.add_dimension(POINT_DIM, self.table.len())?;

        let names: Vec<&str> = self.table.column_names().collect();
        for name in &names {
            let values = self.table.column(name)?;
            let mut var = file.add_variable::<f64>(name, &[POINT_DIM])?;
            var.put_attribute("_FillValue", f64::NAN)?;
            var.put(aview1(values), ..)?;
        }

        file.add_attribute("title", "Flowline profile")?;
        file.add_attribute(
            "history",
            format!("Created by flowline_extract on {}", Utc::now().to_rfc3339()),
        )?;

        info!(
            "Wrote {} columns x {} points to {}",
            names.len(),
            self.table.len(),
            self.output_path.display()
        );
        Ok(())
    }
}
