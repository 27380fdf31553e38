//! Interpolating splines on rectilinear grids
//!
//! [`RectSpline`] is the tensor product of 1-D interpolating splines over a
//! strictly increasing easting axis and a strictly increasing northing axis,
//! with values laid out `[easting, northing]`. Cubic splines use not-a-knot end
//! conditions, which gives the same surface as an unsmoothed (s = 0) cubic
//! B-spline fit through every grid node.
//!
//! Fitting precomputes the easting-direction spline of every northing column.
//! Evaluating a point interpolates each column at the query easting, then runs
//! one northing-direction spline through those values.

use crate::errors::{FlowlineError, Result};
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::Deserialize;

/// Polynomial degree of the interpolating spline on each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplineDegree {
    /// Piecewise linear (bilinear surface)
    Linear,
    /// Piecewise cubic, not-a-knot
    #[default]
    Cubic,
}

impl SplineDegree {
    /// Minimum number of nodes per axis
    pub const fn min_points(self) -> usize {
        match self {
            Self::Linear => 2,
            Self::Cubic => 4,
        }
    }
}

/// Behaviour for query coordinates outside an axis range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extrapolation {
    /// Clamp the coordinate to the nearest axis end
    #[default]
    Clamp,
    /// Continue the outermost polynomial piece
    Extend,
}

/// Node values and moments of a 1-D spline over an axis owned by the caller
#[derive(Debug, Clone)]
struct Spline1d {
    values: Vec<f64>,
    moments: Vec<f64>,
}

impl Spline1d {
    /// Interpolate `values` at the nodes of a validated axis `x`
    fn through(x: &[f64], values: Vec<f64>, degree: SplineDegree) -> Self {
        let moments = moments_for(x, &values, degree);
        Self { values, moments }
    }

    fn eval(&self, x: &[f64], t: f64, extrapolation: Extrapolation) -> f64 {
        eval_moment_form(x, &self.values, &self.moments, t, extrapolation)
    }
}

/// Tensor-product interpolating spline over `[easting, northing]` nodes
#[derive(Debug, Clone)]
pub struct RectSpline {
    easting: Vec<f64>,
    northing: Vec<f64>,
    /// Easting-direction spline of each northing column
    columns: Vec<Spline1d>,
    degree: SplineDegree,
    extrapolation: Extrapolation,
}

impl RectSpline {
    /// Fit the surface through `values[[i, j]]` at `(easting[i], northing[j])`
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::InterpolationDomain`] if either axis is too
    /// short, not strictly increasing, or disagrees with the value shape.
    pub fn fit(
        easting: ArrayView1<f64>,
        northing: ArrayView1<f64>,
        values: ArrayView2<f64>,
        degree: SplineDegree,
        extrapolation: Extrapolation,
    ) -> Result<Self> {
        if values.dim() != (easting.len(), northing.len()) {
            return Err(FlowlineError::domain(format!(
                "values have shape {:?} but axes have lengths ({}, {})",
                values.dim(),
                easting.len(),
                northing.len()
            )));
        }
        check_axis(easting, degree, "easting")?;
        check_axis(northing, degree, "northing")?;

        let easting = easting.to_vec();
        let northing = northing.to_vec();

        let columns = values
            .axis_iter(Axis(1))
            .map(|column| Spline1d::through(&easting, column.to_vec(), degree))
            .collect();

        Ok(Self {
            easting,
            northing,
            columns,
            degree,
            extrapolation,
        })
    }

    /// Evaluate the surface at one point
    pub fn eval(&self, e: f64, n: f64) -> f64 {
        let through_easting: Vec<f64> = self
            .columns
            .iter()
            .map(|column| column.eval(&self.easting, e, self.extrapolation))
            .collect();

        Spline1d::through(&self.northing, through_easting, self.degree).eval(
            &self.northing,
            n,
            self.extrapolation,
        )
    }
}

fn check_axis(axis: ArrayView1<f64>, degree: SplineDegree, name: &str) -> Result<()> {
    if axis.len() < degree.min_points() {
        return Err(FlowlineError::domain(format!(
            "{name} axis has {} nodes, {:?} interpolation needs at least {}",
            axis.len(),
            degree,
            degree.min_points()
        )));
    }
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(FlowlineError::domain(format!(
            "{name} axis contains non-finite coordinates"
        )));
    }
    if axis.windows(2).into_iter().any(|w| w[1] <= w[0]) {
        return Err(FlowlineError::domain(format!(
            "{name} axis is not strictly increasing"
        )));
    }
    Ok(())
}

fn moments_for(x: &[f64], y: &[f64], degree: SplineDegree) -> Vec<f64> {
    match degree {
        SplineDegree::Linear => vec![0.0; x.len()],
        SplineDegree::Cubic => not_a_knot_moments(x, y),
    }
}

/// Second derivatives of the not-a-knot cubic spline through `(x, y)`
///
/// The two not-a-knot rows are folded into the first and last interior
/// equations, leaving a tridiagonal system over the interior moments.
/// Requires at least four nodes.
fn not_a_knot_moments(x: &[f64], y: &[f64]) -> Vec<f64> {
    let n = x.len();
    let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
    let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

    // Interior unknowns M_1..=M_{n-2}, indexed k = i - 1.
    let m = n - 2;
    let mut sub = vec![0.0; m];
    let mut diag = vec![0.0; m];
    let mut sup = vec![0.0; m];
    let mut rhs = vec![0.0; m];

    for k in 0..m {
        let i = k + 1;
        sub[k] = h[i - 1];
        diag[k] = 2.0 * (h[i - 1] + h[i]);
        sup[k] = h[i];
        rhs[k] = 6.0 * (slope[i] - slope[i - 1]);
    }

    // M_0 = ((h0 + h1) M_1 - h0 M_2) / h1
    let (h0, h1) = (h[0], h[1]);
    diag[0] += h0 * (h0 + h1) / h1;
    sup[0] -= h0 * h0 / h1;

    // M_{n-1} = ((h_{n-3} + h_{n-2}) M_{n-2} - h_{n-2} M_{n-3}) / h_{n-3}
    let (ha, hb) = (h[n - 3], h[n - 2]);
    diag[m - 1] += hb * (ha + hb) / ha;
    sub[m - 1] -= hb * hb / ha;

    let interior = solve_tridiagonal(&sub, &diag, &sup, &rhs);

    let mut moments = vec![0.0; n];
    moments[1..n - 1].copy_from_slice(&interior);
    moments[0] = ((h0 + h1) * moments[1] - h0 * moments[2]) / h1;
    moments[n - 1] = ((ha + hb) * moments[n - 2] - hb * moments[n - 3]) / ha;
    moments
}

/// Thomas algorithm; `sub[0]` and `sup[last]` are ignored
fn solve_tridiagonal(sub: &[f64], diag: &[f64], sup: &[f64], rhs: &[f64]) -> Vec<f64> {
    let m = diag.len();
    let mut c = vec![0.0; m];
    let mut d = vec![0.0; m];

    c[0] = sup[0] / diag[0];
    d[0] = rhs[0] / diag[0];
    for k in 1..m {
        let denom = diag[k] - sub[k] * c[k - 1];
        c[k] = sup[k] / denom;
        d[k] = (rhs[k] - sub[k] * d[k - 1]) / denom;
    }

    let mut out = vec![0.0; m];
    out[m - 1] = d[m - 1];
    for k in (0..m - 1).rev() {
        out[k] = d[k] - c[k] * out[k + 1];
    }
    out
}

fn eval_moment_form(x: &[f64], y: &[f64], moments: &[f64], t: f64, mode: Extrapolation) -> f64 {
    let last = x.len() - 1;
    let t = match mode {
        Extrapolation::Clamp => t.clamp(x[0], x[last]),
        Extrapolation::Extend => t,
    };

    // Interval i covers [x[i], x[i + 1]]; outside points use the end pieces.
    let i = x.partition_point(|&node| node <= t).saturating_sub(1).min(last - 1);

    let h = x[i + 1] - x[i];
    let a = x[i + 1] - t;
    let b = t - x[i];
    moments[i] * a.powi(3) / (6.0 * h)
        + moments[i + 1] * b.powi(3) / (6.0 * h)
        + (y[i] / h - moments[i] * h / 6.0) * a
        + (y[i + 1] / h - moments[i + 1] * h / 6.0) * b
}
