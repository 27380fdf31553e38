//! Gridded data model shared by the loaders, gap filler and sampler
//!
//! A [`LayerSet`] holds every layer read from one source file together with
//! the easting/northing axes they share. Layers are stored row-major as
//! `[northing, easting]`, in the pixel order of the source (north to south
//! for north-up rasters).

use crate::errors::{FlowlineError, Result};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;

/// Missing-data sentinel used by the source rasters and by gap-filled output
pub const SENTINEL: f64 = -9999.0;

/// Affine georeferencing of a north-up raster
///
/// Same coefficient layout as a GDAL geotransform without the rotation terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// Easting of the upper-left corner
    pub origin_x: f64,
    /// Northing of the upper-left corner
    pub origin_y: f64,
    /// Cell size along easting
    pub pixel_width: f64,
    /// Cell size along northing, negative for north-up rasters
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        }
    }

    /// Pixel-centred easting for each of `nx` columns
    pub fn easting_axis(&self, nx: usize) -> Array1<f64> {
        Array1::from_iter((0..nx).map(|i| self.origin_x + self.pixel_width * (i as f64 + 0.5)))
    }

    /// Pixel-centred northing for each of `ny` rows
    pub fn northing_axis(&self, ny: usize) -> Array1<f64> {
        Array1::from_iter((0..ny).map(|j| self.origin_y + self.pixel_height * (j as f64 + 0.5)))
    }
}

/// Layers from one source file sharing a single pair of coordinate axes
#[derive(Debug, Clone)]
pub struct LayerSet {
    easting: Array1<f64>,
    northing: Array1<f64>,
    layers: BTreeMap<String, Array2<f64>>,
}

impl LayerSet {
    /// Create an empty layer set over the given axes
    pub fn new(easting: Array1<f64>, northing: Array1<f64>) -> Self {
        Self {
            easting,
            northing,
            layers: BTreeMap::new(),
        }
    }

    pub fn easting(&self) -> &Array1<f64> {
        &self.easting
    }

    pub fn northing(&self) -> &Array1<f64> {
        &self.northing
    }

    /// Expected layer shape, `(northing.len(), easting.len())`
    pub fn shape(&self) -> (usize, usize) {
        (self.northing.len(), self.easting.len())
    }

    /// Add a layer, replacing any layer with the same name
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::Format`] if the layer shape does not match the axes.
    pub fn insert(&mut self, name: impl Into<String>, grid: Array2<f64>) -> Result<()> {
        let name = name.into();
        if grid.dim() != self.shape() {
            return Err(FlowlineError::format(format!(
                "layer '{}' has shape {:?} but axes describe {:?}",
                name,
                grid.dim(),
                self.shape()
            )));
        }
        self.layers.insert(name, grid);
        Ok(())
    }

    /// Look up a layer by name
    pub fn layer(&self, name: &str) -> Result<&Array2<f64>> {
        self.layers
            .get(name)
            .ok_or_else(|| FlowlineError::LayerNotFound {
                layer: name.to_string(),
            })
    }

    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.layers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Replace every `sentinel` cell with NaN
pub fn normalize_sentinel(grid: &mut Array2<f64>, sentinel: f64) {
    grid.mapv_inplace(|v| if v == sentinel { f64::NAN } else { v });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn axes_are_pixel_centred() {
        let gt = GeoTransform::new(-600_000.0, -1_100_000.0, 1000.0, -1000.0);
        let easting = gt.easting_axis(3);
        let northing = gt.northing_axis(2);
        assert_eq!(easting.to_vec(), vec![-599_500.0, -598_500.0, -597_500.0]);
        assert_eq!(northing.to_vec(), vec![-1_100_500.0, -1_101_500.0]);
    }

    #[test]
    fn insert_rejects_mismatched_shape() {
        let mut set = LayerSet::new(array![0.0, 1.0, 2.0], array![1.0, 0.0]);
        assert!(set.insert("ok", Array2::zeros((2, 3))).is_ok());
        let err = set.insert("transposed", Array2::zeros((3, 2))).unwrap_err();
        assert!(matches!(err, FlowlineError::Format { .. }));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn missing_layer_is_reported_by_name() {
        let set = LayerSet::new(array![0.0], array![0.0]);
        match set.layer("bed") {
            Err(FlowlineError::LayerNotFound { layer }) => assert_eq!(layer, "bed"),
            other => panic!("expected LayerNotFound, got {other:?}"),
        }
    }

    #[test]
    fn sentinel_cells_become_nan() {
        let mut grid = array![[1.0, SENTINEL], [SENTINEL, 4.0]];
        normalize_sentinel(&mut grid, SENTINEL);
        assert_eq!(grid[[0, 0]], 1.0);
        assert!(grid[[0, 1]].is_nan());
        assert!(grid[[1, 0]].is_nan());
        assert_eq!(grid[[1, 1]], 4.0);
    }
}
