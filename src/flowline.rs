//! Flowline table: ordered points along a glacier flowline plus sampled columns
//!
//! The table is read from a CSV whose first column is an index (kept verbatim)
//! and which holds at least `distance`, `easting` and `northing`. Columns are
//! appended in the order they are set; setting an existing name replaces it in
//! place. Rows are never reordered or dropped.

use crate::errors::{ensure_exists, FlowlineError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, warn};

pub const DISTANCE: &str = "distance";
pub const EASTING: &str = "easting";
pub const NORTHING: &str = "northing";

/// One named column of values, one per point
#[derive(Debug, Clone, PartialEq)]
struct Column {
    name: String,
    values: Vec<f64>,
}

/// One row of the table
#[derive(Debug, Clone, PartialEq)]
pub struct FlowlinePoint {
    /// Position of the row in the table or selection it came from
    pub index: usize,
    pub distance: f64,
    pub easting: f64,
    pub northing: f64,
    /// Every other column, in table order
    pub attributes: Vec<(String, f64)>,
}

/// Ordered flowline points with their attribute columns
#[derive(Debug, Clone, PartialEq)]
pub struct FlowlineTable {
    index_name: String,
    index: Vec<String>,
    columns: Vec<Column>,
    distance_col: usize,
    easting_col: usize,
    northing_col: usize,
}

impl FlowlineTable {
    /// Build a table from its three coordinate columns, indexed from zero
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::ColumnMismatch`] if the columns differ in length.
    pub fn new(distance: Vec<f64>, easting: Vec<f64>, northing: Vec<f64>) -> Result<Self> {
        let n = distance.len();
        for (name, len) in [(EASTING, easting.len()), (NORTHING, northing.len())] {
            if len != n {
                return Err(FlowlineError::ColumnMismatch {
                    column: name.to_string(),
                    expected: n,
                    found: len,
                });
            }
        }
        Ok(Self {
            index_name: String::new(),
            index: (0..n).map(|i| i.to_string()).collect(),
            columns: vec![
                Column {
                    name: DISTANCE.to_string(),
                    values: distance,
                },
                Column {
                    name: EASTING.to_string(),
                    values: easting,
                },
                Column {
                    name: NORTHING.to_string(),
                    values: northing,
                },
            ],
            distance_col: 0,
            easting_col: 1,
            northing_col: 2,
        })
    }

    /// Read a flowline CSV
    pub fn read_csv(path: &Path) -> Result<Self> {
        ensure_exists(path)?;
        let table = Self::from_reader(File::open(path)?)?;
        debug!(
            "Read {} flowline points with columns {:?} from {}",
            table.len(),
            table.column_names().collect::<Vec<_>>(),
            path.display()
        );
        Ok(table)
    }

    /// Parse a flowline CSV; the first column is the index
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::Format`] if a coordinate column is missing, a
    /// header repeats, or a value is not numeric.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let mut names = headers.iter();
        let index_name = names
            .next()
            .ok_or_else(|| FlowlineError::format("flowline CSV has no columns"))?
            .to_string();
        let mut columns: Vec<Column> = Vec::new();
        for name in names {
            if columns.iter().any(|c| c.name == name) {
                return Err(FlowlineError::format(format!(
                    "flowline CSV repeats column '{name}'"
                )));
            }
            columns.push(Column {
                name: name.to_string(),
                values: Vec::new(),
            });
        }

        let mut index = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let mut fields = record.iter();
            index.push(fields.next().unwrap_or_default().to_string());
            for (column, field) in columns.iter_mut().zip(fields) {
                column.values.push(parse_value(field, &column.name, row)?);
            }
        }

        let position = |name: &str| {
            columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| FlowlineError::format(format!("flowline CSV has no '{name}' column")))
        };
        let distance_col = position(DISTANCE)?;
        let easting_col = position(EASTING)?;
        let northing_col = position(NORTHING)?;

        let table = Self {
            index_name,
            index,
            columns,
            distance_col,
            easting_col,
            northing_col,
        };
        table.warn_if_unordered();
        Ok(table)
    }

    /// Write the table, index first, to a CSV file
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        self.to_writer(File::create(path)?)
    }

    /// Write the table as CSV; NaN values are written as empty cells
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header = vec![self.index_name.as_str()];
        header.extend(self.columns.iter().map(|c| c.name.as_str()));
        wtr.write_record(&header)?;

        for (row, label) in self.index.iter().enumerate() {
            let mut record = vec![label.clone()];
            record.extend(self.columns.iter().map(|c| format_value(c.values[row])));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn distance(&self) -> &[f64] {
        &self.columns[self.distance_col].values
    }

    pub fn easting(&self) -> &[f64] {
        &self.columns[self.easting_col].values
    }

    pub fn northing(&self) -> &[f64] {
        &self.columns[self.northing_col].values
    }

    /// Index labels as read from the source CSV
    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Values of a column by name
    pub fn column(&self, name: &str) -> Result<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
            .ok_or_else(|| FlowlineError::ColumnNotFound {
                column: name.to_string(),
            })
    }

    /// Append a column, or replace an existing one of the same name in place
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::ColumnMismatch`] if `values` does not hold
    /// one value per point.
    pub fn set_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.len() {
            return Err(FlowlineError::ColumnMismatch {
                column: name.to_string(),
                expected: self.len(),
                found: values.len(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => column.values = values,
            None => self.columns.push(Column {
                name: name.to_string(),
                values,
            }),
        }
        Ok(())
    }

    /// Set `target` to `minuend - subtrahend`, row by row
    pub fn set_difference(&mut self, target: &str, minuend: &str, subtrahend: &str) -> Result<()> {
        let values = self
            .column(minuend)?
            .iter()
            .zip(self.column(subtrahend)?)
            .map(|(a, b)| a - b)
            .collect();
        self.set_column(target, values)
    }

    /// Add the mass loss and mass balance columns
    ///
    /// `mass_loss = runoff - sublimation`, then
    /// `mass_balance = precipitation - mass_loss`.
    pub fn derive_mass_balance(&mut self, names: &MassBalanceColumns) -> Result<()> {
        self.set_difference(&names.mass_loss, &names.runoff, &names.sublimation)?;
        self.set_difference(&names.mass_balance, &names.precipitation, &names.mass_loss)
    }

    /// Row `i` as a point
    pub fn point(&self, i: usize) -> Option<FlowlinePoint> {
        if i >= self.len() {
            return None;
        }
        let coordinate = [self.distance_col, self.easting_col, self.northing_col];
        let attributes = self
            .columns
            .iter()
            .enumerate()
            .filter(|(c, _)| !coordinate.contains(c))
            .map(|(_, column)| (column.name.clone(), column.values[i]))
            .collect();
        Some(FlowlinePoint {
            index: i,
            distance: self.distance()[i],
            easting: self.easting()[i],
            northing: self.northing()[i],
            attributes,
        })
    }

    pub fn points(&self) -> impl Iterator<Item = FlowlinePoint> + '_ {
        (0..self.len()).filter_map(move |i| self.point(i))
    }

    fn warn_if_unordered(&self) {
        if self.distance().windows(2).any(|w| !(w[1] > w[0])) {
            warn!("Flowline distance is not strictly increasing");
        }
    }
}

/// Column names used for the derived mass balance columns
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MassBalanceColumns {
    pub precipitation: String,
    pub runoff: String,
    pub sublimation: String,
    pub mass_loss: String,
    pub mass_balance: String,
}

impl Default for MassBalanceColumns {
    fn default() -> Self {
        Self {
            precipitation: "ramco_total_precipitation_mm_water_equivalent".to_string(),
            runoff: "ramco_runoff_mm_water_equivalent".to_string(),
            sublimation: "ramco_sublimation_mm_water_equivalent".to_string(),
            mass_loss: "ramco_total_mass_loss".to_string(),
            mass_balance: "ramco_mass_balance".to_string(),
        }
    }
}

fn parse_value(field: &str, column: &str, row: usize) -> Result<f64> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(f64::NAN);
    }
    field.parse::<f64>().map_err(|_| {
        FlowlineError::format(format!(
            "value '{field}' in column '{column}' row {row} is not a number"
        ))
    })
}

fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        format!("{value:?}")
    }
}
