//! Gaussian gap filling for rasters with missing cells
//!
//! Each pass convolves the grid with a normalized Gaussian kernel, averaging
//! only the defined (non-NaN) neighbours inside the kernel support. Passes are
//! not chained: every pass starts again from the source grid and only the last
//! one is kept. Cells left without any defined neighbour are written as
//! [`SENTINEL`].

use crate::errors::{FlowlineError, Result};
use crate::grid::SENTINEL;
use ndarray::{Array2, Zip};
use serde::Deserialize;
use tracing::{debug, warn};

/// Gap filling parameters
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GapFillOptions {
    /// Number of smoothing passes
    pub iterations: usize,
    /// Kernel standard deviation in cells, used on both axes
    pub stddev: f64,
    /// Keep originally valid cells untouched and only replace the holes
    pub preserve_valid: bool,
}

impl Default for GapFillOptions {
    fn default() -> Self {
        Self {
            iterations: 4,
            stddev: 1.0,
            preserve_valid: false,
        }
    }
}

/// Result of a gap filling run
#[derive(Debug, Clone)]
pub enum FillOutcome {
    /// Every cell received a smoothed value
    Complete(Array2<f64>),
    /// Some cells had no defined neighbour and were set to the sentinel
    Residual { grid: Array2<f64>, cells: usize },
}

impl FillOutcome {
    pub fn grid(&self) -> &Array2<f64> {
        match self {
            Self::Complete(grid) | Self::Residual { grid, .. } => grid,
        }
    }

    pub fn into_grid(self) -> Array2<f64> {
        match self {
            Self::Complete(grid) | Self::Residual { grid, .. } => grid,
        }
    }

    /// Number of cells written as the sentinel
    pub fn residual_cells(&self) -> usize {
        match self {
            Self::Complete(_) => 0,
            Self::Residual { cells, .. } => *cells,
        }
    }
}

/// Build a square Gaussian kernel covering eight standard deviations
///
/// The side length is `8 * stddev` rounded up to the next odd integer, so a
/// standard deviation of 1 gives a 9×9 kernel. Weights are sampled at cell
/// centres and normalized to sum to one.
pub fn gaussian_kernel(stddev: f64) -> Array2<f64> {
    let mut size = (8.0 * stddev).ceil().max(1.0) as usize;
    if size % 2 == 0 {
        size += 1;
    }
    let half = (size / 2) as f64;
    let two_var = 2.0 * stddev * stddev;

    let mut kernel = Array2::from_shape_fn((size, size), |(r, c)| {
        let dy = r as f64 - half;
        let dx = c as f64 - half;
        (-(dx * dx + dy * dy) / two_var).exp()
    });
    let total = kernel.sum();
    kernel.mapv_inplace(|w| w / total);
    kernel
}

/// Fill NaN holes in `grid` by Gaussian-weighted local averaging
///
/// # Errors
///
/// Returns [`FlowlineError::Config`] if `options.iterations` is zero or the
/// standard deviation is not positive.
pub fn fill_gaps(grid: &Array2<f64>, options: &GapFillOptions) -> Result<FillOutcome> {
    if options.iterations == 0 {
        return Err(FlowlineError::config(
            "gap filling needs at least one iteration",
        ));
    }
    if !(options.stddev > 0.0) {
        return Err(FlowlineError::config(format!(
            "gap filling kernel stddev must be positive, got {}",
            options.stddev
        )));
    }

    let kernel = gaussian_kernel(options.stddev);
    let holes = grid.iter().filter(|v| v.is_nan()).count();
    debug!(
        "Gap filling {:?} grid with {} holes, {}x{} kernel, {} passes",
        grid.dim(),
        holes,
        kernel.nrows(),
        kernel.ncols(),
        options.iterations
    );

    let mut filled = smooth_pass(grid, &kernel, options.preserve_valid);
    for _ in 1..options.iterations {
        filled = smooth_pass(grid, &kernel, options.preserve_valid);
    }

    let mut cells = 0;
    filled.mapv_inplace(|v| {
        if v.is_nan() {
            cells += 1;
            SENTINEL
        } else {
            v
        }
    });

    if cells == 0 {
        Ok(FillOutcome::Complete(filled))
    } else {
        warn!(
            "{} of {} cells had no defined neighbour and were set to {}",
            cells,
            filled.len(),
            SENTINEL
        );
        Ok(FillOutcome::Residual {
            grid: filled,
            cells,
        })
    }
}

fn smooth_pass(source: &Array2<f64>, kernel: &Array2<f64>, preserve_valid: bool) -> Array2<f64> {
    let (rows, cols) = source.dim();
    let half = (kernel.nrows() / 2) as isize;
    let mut out = Array2::from_elem((rows, cols), f64::NAN);

    Zip::indexed(&mut out).par_for_each(|(r, c), cell| {
        let centre = source[[r, c]];
        if preserve_valid && !centre.is_nan() {
            *cell = centre;
            return;
        }

        let mut weighted = 0.0;
        let mut weights = 0.0;
        for ((kr, kc), &w) in kernel.indexed_iter() {
            let sr = r as isize + kr as isize - half;
            let sc = c as isize + kc as isize - half;
            if sr < 0 || sc < 0 || sr >= rows as isize || sc >= cols as isize {
                continue;
            }
            let v = source[[sr as usize, sc as usize]];
            if v.is_nan() {
                continue;
            }
            weighted += w * v;
            weights += w;
        }

        if weights > 0.0 {
            *cell = weighted / weights;
        }
    });

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn unit_stddev_gives_nine_by_nine_kernel() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.dim(), (9, 9));
        assert_relative_eq!(kernel.sum(), 1.0, epsilon = 1e-12);
        assert_eq!(kernel[[4, 4]], kernel.iter().cloned().fold(0.0, f64::max));
        assert_relative_eq!(kernel[[0, 4]], kernel[[4, 0]]);
        assert_relative_eq!(kernel[[8, 8]], kernel[[0, 0]]);
    }

    #[test]
    fn filled_grid_has_no_nan() {
        let mut grid = Array2::from_shape_fn((12, 15), |(r, c)| (r * 3 + c) as f64);
        for &(r, c) in &[(0, 0), (5, 7), (5, 8), (6, 7), (11, 14), (3, 0)] {
            grid[[r, c]] = f64::NAN;
        }
        let outcome = fill_gaps(&grid, &GapFillOptions::default()).unwrap();
        assert_eq!(outcome.residual_cells(), 0);
        assert!(outcome.grid().iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn constant_grid_with_holes_fills_with_constant() {
        let mut grid = Array2::from_elem((10, 10), 253.5);
        grid[[4, 4]] = f64::NAN;
        grid[[0, 9]] = f64::NAN;
        let filled = fill_gaps(&grid, &GapFillOptions::default())
            .unwrap()
            .into_grid();
        for v in filled.iter() {
            assert_relative_eq!(*v, 253.5, epsilon = 1e-9);
        }
    }

    #[test]
    fn all_nan_grid_becomes_sentinel() {
        let grid = Array2::from_elem((4, 6), f64::NAN);
        let outcome = fill_gaps(&grid, &GapFillOptions::default()).unwrap();
        assert_eq!(outcome.residual_cells(), 24);
        assert!(outcome.grid().iter().all(|&v| v == SENTINEL));
    }

    #[test]
    fn isolated_hole_outside_kernel_support_becomes_sentinel() {
        let mut grid = Array2::from_elem((1, 20), f64::NAN);
        grid[[0, 0]] = 1.0;
        let outcome = fill_gaps(&grid, &GapFillOptions::default()).unwrap();
        let filled = outcome.grid();
        for c in 0..=4 {
            assert_relative_eq!(filled[[0, c]], 1.0);
        }
        for c in 5..20 {
            assert_eq!(filled[[0, c]], SENTINEL);
        }
        assert_eq!(outcome.residual_cells(), 15);
    }

    #[test]
    fn smoothing_replaces_valid_cells_unless_preserved() {
        let mut grid = Array2::zeros((9, 9));
        grid[[4, 4]] = 100.0;
        grid[[0, 0]] = f64::NAN;

        let smoothed = fill_gaps(&grid, &GapFillOptions::default())
            .unwrap()
            .into_grid();
        assert!(smoothed[[4, 4]] < 100.0);
        assert!(smoothed[[4, 5]] > 0.0);

        let options = GapFillOptions {
            preserve_valid: true,
            ..GapFillOptions::default()
        };
        let preserved = fill_gaps(&grid, &options).unwrap().into_grid();
        assert_eq!(preserved[[4, 4]], 100.0);
        assert_eq!(preserved[[4, 5]], 0.0);
        assert!(!preserved[[0, 0]].is_nan());
    }

    #[test]
    fn iteration_count_does_not_change_result() {
        let mut grid = Array2::from_shape_fn((8, 8), |(r, c)| (r as f64).sin() + c as f64);
        grid[[3, 3]] = f64::NAN;
        let once = GapFillOptions {
            iterations: 1,
            ..GapFillOptions::default()
        };
        let a = fill_gaps(&grid, &once).unwrap().into_grid();
        let b = fill_gaps(&grid, &GapFillOptions::default())
            .unwrap()
            .into_grid();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_iterations_is_rejected() {
        let grid = Array2::zeros((2, 2));
        let options = GapFillOptions {
            iterations: 0,
            ..GapFillOptions::default()
        };
        assert!(matches!(
            fill_gaps(&grid, &options),
            Err(FlowlineError::Config { .. })
        ));
    }
}
