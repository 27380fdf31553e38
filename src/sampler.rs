//! Sampling gridded layers along a path of (easting, northing) points
//!
//! Layers are stored `[northing, easting]` with northing usually running north
//! to south. The spline needs both axes increasing and values laid out
//! `[easting, northing]`, so a descending northing axis is reversed together
//! with the layer rows and the layer is then transposed. Getting this wrong
//! silently mirrors or transposes every sample.
//!
//! Every call fits a fresh surface over the whole layer; nothing is cached.
//! Undefined nodes, such as masked NetCDF fill cells, enter the fit as
//! [`SENTINEL`] so that a hole only disturbs samples near it.

use crate::errors::{FlowlineError, Result};
use crate::grid::{LayerSet, SENTINEL};
use crate::spline::{Extrapolation, RectSpline, SplineDegree};
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

/// Interpolation settings for path sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct SamplerOptions {
    pub degree: SplineDegree,
    pub extrapolation: Extrapolation,
}

/// Reorient a `[northing, easting]` layer for spline fitting
///
/// Returns the increasing northing axis and the layer transposed to
/// `[easting, northing]`, with rows reversed when the northing axis was
/// descending.
///
/// # Errors
///
/// Returns [`FlowlineError::InterpolationDomain`] if the northing axis is
/// neither strictly increasing nor strictly decreasing, or the layer shape
/// does not match the axes.
pub fn orient_for_spline(
    easting: ArrayView1<f64>,
    northing: ArrayView1<f64>,
    layer: ArrayView2<f64>,
) -> Result<(Array1<f64>, Array2<f64>)> {
    if layer.dim() != (northing.len(), easting.len()) {
        return Err(FlowlineError::domain(format!(
            "layer shape {:?} does not match axes (northing {}, easting {})",
            layer.dim(),
            northing.len(),
            easting.len()
        )));
    }

    let descending = northing.len() > 1 && northing.windows(2).into_iter().all(|w| w[1] < w[0]);
    if descending {
        let northing = northing.slice(s![..;-1]).to_owned();
        let values = layer.slice(s![..;-1, ..]).t().to_owned();
        Ok((northing, values))
    } else {
        // Ascending (or invalid) axes are passed through; the fit validates them.
        Ok((northing.to_owned(), layer.t().to_owned()))
    }
}

/// Fit a surface over one layer of `layers`
pub fn fit_layer(layers: &LayerSet, layer: &str, options: &SamplerOptions) -> Result<RectSpline> {
    let grid = layers.layer(layer)?;
    let (northing, mut values) =
        orient_for_spline(layers.easting().view(), layers.northing().view(), grid.view())?;
    let undefined = values.iter().filter(|v| !v.is_finite()).count();
    if undefined > 0 {
        warn!(
            "Layer '{}' has {} undefined nodes, fitting them as {}",
            layer, undefined, SENTINEL
        );
        values.mapv_inplace(|v| if v.is_finite() { v } else { SENTINEL });
    }
    debug!(
        "Fitting {:?} spline over layer '{}' ({} x {})",
        options.degree,
        layer,
        layers.easting().len(),
        northing.len()
    );
    RectSpline::fit(
        layers.easting().view(),
        northing.view(),
        values.view(),
        options.degree,
        options.extrapolation,
    )
}

/// Sample `layer` at every `(easting, northing)` point, in order
///
/// # Errors
///
/// Returns an error if the layer is missing, the coordinate slices differ in
/// length, or the axes cannot support the interpolation.
pub fn sample_layer(
    layers: &LayerSet,
    layer: &str,
    easting: &[f64],
    northing: &[f64],
    options: &SamplerOptions,
) -> Result<Vec<f64>> {
    if easting.len() != northing.len() {
        return Err(FlowlineError::ColumnMismatch {
            column: "northing".to_string(),
            expected: easting.len(),
            found: northing.len(),
        });
    }

    let surface = fit_layer(layers, layer, options)?;
    Ok(easting
        .par_iter()
        .zip(northing.par_iter())
        .map(|(&e, &n)| surface.eval(e, n))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn north_up_set() -> LayerSet {
        // 5 columns east, 4 rows north to south
        let easting = array![100.0, 200.0, 300.0, 400.0, 500.0];
        let northing = array![40.0, 30.0, 20.0, 10.0];
        let layer = Array2::from_shape_fn((4, 5), |(r, c)| (r * 10 + c) as f64);
        let mut set = LayerSet::new(easting, northing);
        set.insert("grid", layer).unwrap();
        set
    }

    #[test]
    fn descending_northing_is_reversed_with_rows() {
        let set = north_up_set();
        let (northing, values) = orient_for_spline(
            set.easting().view(),
            set.northing().view(),
            set.layer("grid").unwrap().view(),
        )
        .unwrap();
        assert_eq!(northing.to_vec(), vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(values.dim(), (5, 4));
        // southernmost row, first column
        assert_eq!(values[[0, 0]], 30.0);
        // northernmost row, last column
        assert_eq!(values[[4, 3]], 4.0);
    }

    #[test]
    fn corners_return_original_values() {
        let set = north_up_set();
        let layer = set.layer("grid").unwrap().clone();
        let easting = [100.0, 500.0, 100.0, 500.0];
        let northing = [40.0, 40.0, 10.0, 10.0];
        for options in [
            SamplerOptions::default(),
            SamplerOptions {
                degree: SplineDegree::Linear,
                ..SamplerOptions::default()
            },
        ] {
            let sampled = sample_layer(&set, "grid", &easting, &northing, &options).unwrap();
            assert_abs_diff_eq!(sampled[0], layer[[0, 0]], epsilon = 1e-9);
            assert_abs_diff_eq!(sampled[1], layer[[0, 4]], epsilon = 1e-9);
            assert_abs_diff_eq!(sampled[2], layer[[3, 0]], epsilon = 1e-9);
            assert_abs_diff_eq!(sampled[3], layer[[3, 4]], epsilon = 1e-9);
        }
    }

    #[test]
    fn ascending_northing_is_kept() {
        let easting = array![0.0, 1.0, 2.0, 3.0];
        let northing = array![0.0, 1.0, 2.0, 3.0];
        let layer = Array2::from_shape_fn((4, 4), |(r, c)| 5.0 * r as f64 + c as f64);
        let mut set = LayerSet::new(easting, northing);
        set.insert("grid", layer).unwrap();
        let sampled =
            sample_layer(&set, "grid", &[2.0, 0.5], &[3.0, 1.5], &SamplerOptions::default())
                .unwrap();
        assert_abs_diff_eq!(sampled[0], 17.0, epsilon = 1e-9);
        assert_abs_diff_eq!(sampled[1], 8.0, epsilon = 1e-9);
    }

    #[test]
    fn undefined_node_only_disturbs_nearby_samples() {
        let easting = Array1::from_iter((0..20).map(|i| i as f64 * 100.0));
        let northing = Array1::from_iter((0..20).rev().map(|i| i as f64 * 100.0));
        let mut layer = Array2::from_elem((20, 20), 5.0);
        // south-east corner
        layer[[19, 19]] = f64::NAN;
        let mut set = LayerSet::new(easting, northing);
        set.insert("velocity", layer).unwrap();

        let sampled = sample_layer(
            &set,
            "velocity",
            &[100.0, 550.0, 900.0],
            &[1800.0, 1250.0, 900.0],
            &SamplerOptions::default(),
        )
        .unwrap();
        for v in sampled {
            assert!(v.is_finite());
            assert_abs_diff_eq!(v, 5.0, epsilon = 1e-3);
        }

        let at_hole =
            sample_layer(&set, "velocity", &[1900.0], &[0.0], &SamplerOptions::default()).unwrap();
        assert_abs_diff_eq!(at_hole[0], SENTINEL, epsilon = 1e-6);
    }

    #[test]
    fn mismatched_coordinates_are_rejected() {
        let set = north_up_set();
        let err = sample_layer(&set, "grid", &[1.0, 2.0], &[1.0], &SamplerOptions::default())
            .unwrap_err();
        assert!(matches!(err, FlowlineError::ColumnMismatch { .. }));
    }

    #[test]
    fn out_of_range_points_follow_extrapolation_mode() {
        let set = north_up_set();
        // layer value = 10 * row + col, row 0 at northing 40, col 0 at easting 100
        let clamp = sample_layer(&set, "grid", &[700.0], &[40.0], &SamplerOptions::default())
            .unwrap();
        assert_abs_diff_eq!(clamp[0], 4.0, epsilon = 1e-9);

        let extend = SamplerOptions {
            extrapolation: Extrapolation::Extend,
            ..SamplerOptions::default()
        };
        let extended = sample_layer(&set, "grid", &[700.0], &[40.0], &extend).unwrap();
        assert_abs_diff_eq!(extended[0], 6.0, epsilon = 1e-9);
    }
}
