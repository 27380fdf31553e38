//! NetCDF loading with a fixed variable mapping per data family
//!
//! Each supported family names the variables to read and the layer each one
//! becomes; every family shares the `x`/`y` coordinate variables. An
//! unrecognized family tag reads nothing and yields [`LoadOutcome::Empty`].

use super::LoadOutcome;
use crate::errors::{ensure_exists, FlowlineError, Result};
use crate::grid::LayerSet;
use ndarray::{Array1, Array2};
use netcdf::{AttributeValue, File, Variable};
use std::path::Path;
use tracing::{debug, info, warn};

/// Supported NetCDF data families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFamily {
    /// PROMICE multi-year ice velocity mosaic (m/day), time-stacked
    Promice,
    /// MEaSUREs / ITS_LIVE velocity composite (m/yr)
    Measures,
    /// BedMachine Greenland surface, thickness and bed
    Bedmachine,
}

impl DataFamily {
    /// Parse a family tag, ignoring case
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "promice" => Some(Self::Promice),
            "measures" => Some(Self::Measures),
            "bedmachine" => Some(Self::Bedmachine),
            _ => None,
        }
    }

    /// `(source variable, layer name)` pairs read for this family
    pub const fn variables(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::Promice => &[
                ("land_ice_surface_easting_velocity", "velocity_easting"),
                ("land_ice_surface_northing_velocity", "velocity_northing"),
                ("land_ice_surface_velocity_magnitude", "velocity_magnitude"),
            ],
            Self::Measures => &[
                ("vx", "velocity_easting"),
                ("vy", "velocity_northing"),
                ("v", "velocity_magnitude"),
            ],
            Self::Bedmachine => &[
                ("surface", "surface"),
                ("thickness", "thickness"),
                ("bed", "bed"),
            ],
        }
    }
}

const EASTING_VAR: &str = "x";
const NORTHING_VAR: &str = "y";

/// Load the layers of `family_tag` from a NetCDF file
///
/// # Errors
///
/// Returns [`FlowlineError::FileNotFound`] for a missing file,
/// [`FlowlineError::VariableNotFound`] when a mapped variable is absent and
/// [`FlowlineError::Format`] when a variable does not fit the `y`/`x` grid.
pub fn load_netcdf(path: &Path, family_tag: &str) -> Result<LoadOutcome> {
    ensure_exists(path)?;
    let file = netcdf::open(path)?;

    let names: Vec<String> = file.variables().map(|v| v.name()).collect();
    debug!("{} variables: {:?}", path.display(), names);

    let Some(family) = DataFamily::from_tag(family_tag) else {
        warn!(
            "Unsupported data family '{}' for {}, no layers read",
            family_tag,
            path.display()
        );
        return Ok(LoadOutcome::Empty {
            family: family_tag.to_string(),
        });
    };

    let easting = read_axis(&file, EASTING_VAR)?;
    let northing = read_axis(&file, NORTHING_VAR)?;
    let mut layers = LayerSet::new(easting, northing);
    let shape = layers.shape();

    for &(var_name, layer_name) in family.variables() {
        let grid = read_layer(&file, var_name, shape)?;
        layers.insert(layer_name, grid)?;
    }

    info!(
        "Loaded {:?} layers {:?} ({} x {}) from {}",
        family,
        layers.layer_names().collect::<Vec<_>>(),
        shape.1,
        shape.0,
        path.display()
    );
    Ok(LoadOutcome::Loaded(layers))
}

fn variable<'f>(file: &'f File, name: &str) -> Result<Variable<'f>> {
    file.variable(name)
        .ok_or_else(|| FlowlineError::VariableNotFound {
            var: name.to_string(),
        })
}

fn read_axis(file: &File, name: &str) -> Result<Array1<f64>> {
    let var = variable(file, name)?;
    if var.dimensions().len() != 1 {
        return Err(FlowlineError::format(format!(
            "coordinate variable '{}' has {} dimensions, expected 1",
            name,
            var.dimensions().len()
        )));
    }
    Ok(Array1::from(var.get_values::<f64, _>(..)?))
}

/// Read a `[y, x]` grid, taking the first step of a leading time dimension
fn read_layer(file: &File, name: &str, (ny, nx): (usize, usize)) -> Result<Array2<f64>> {
    let var = variable(file, name)?;
    let dims: Vec<usize> = var.dimensions().iter().map(netcdf::Dimension::len).collect();

    let values = match dims.as_slice() {
        [rows, cols] if (*rows, *cols) == (ny, nx) => var.get_values::<f64, _>(..)?,
        [steps, rows, cols] if *steps > 0 && (*rows, *cols) == (ny, nx) => {
            var.get_values::<f64, _>((0..1, 0..ny, 0..nx))?
        }
        _ => {
            return Err(FlowlineError::format(format!(
                "variable '{}' has shape {:?}, expected [{}, {}] or [time, {}, {}]",
                name, dims, ny, nx, ny, nx
            )))
        }
    };

    let fill_value = attribute_f64(&var, "_FillValue")?;
    let scale = attribute_f64(&var, "scale_factor")?.unwrap_or(1.0);
    let offset = attribute_f64(&var, "add_offset")?.unwrap_or(0.0);

    let mut grid = Array2::from_shape_vec((ny, nx), values)?;
    grid.mapv_inplace(|v| match fill_value {
        Some(fill) if v == fill => f64::NAN,
        _ => v * scale + offset,
    });
    Ok(grid)
}

fn attribute_f64(var: &Variable, name: &str) -> Result<Option<f64>> {
    let Some(attr) = var.attribute(name) else {
        return Ok(None);
    };
    Ok(match attr.value()? {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(f64::from(v)),
        AttributeValue::Int(v) => Some(f64::from(v)),
        AttributeValue::Short(v) => Some(f64::from(v)),
        AttributeValue::Ushort(v) => Some(f64::from(v)),
        AttributeValue::Uchar(v) => Some(f64::from(v)),
        AttributeValue::Schar(v) => Some(f64::from(v)),
        AttributeValue::Doubles(vs) => vs.first().copied(),
        AttributeValue::Floats(vs) => vs.first().map(|&v| f64::from(v)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_tags_are_case_insensitive() {
        assert_eq!(DataFamily::from_tag("Bedmachine"), Some(DataFamily::Bedmachine));
        assert_eq!(DataFamily::from_tag("PROMICE"), Some(DataFamily::Promice));
        assert_eq!(DataFamily::from_tag("measures"), Some(DataFamily::Measures));
        assert_eq!(DataFamily::from_tag("ArcticDEM"), None);
    }

    #[test]
    fn velocity_families_share_layer_names() {
        let layers = |f: DataFamily| -> Vec<&str> { f.variables().iter().map(|v| v.1).collect() };
        assert_eq!(layers(DataFamily::Promice), layers(DataFamily::Measures));
        assert_eq!(
            layers(DataFamily::Bedmachine),
            vec!["surface", "thickness", "bed"]
        );
    }
}
