//! Centralized error handling for flowline extraction
//!
//! Every stage of a run (loading, gap filling, sampling, table assembly and
//! export) reports failures through [`FlowlineError`]. Nothing is recovered
//! locally: errors propagate to the caller and terminate the run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for flowline extraction
#[derive(Debug, Error)]
pub enum FlowlineError {
    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Source structure does not match what the loader expects
    #[error("Format error: {message}")]
    Format { message: String },

    /// Variable not found in a NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Layer not present in a layer set
    #[error("Layer '{layer}' not found in layer set")]
    LayerNotFound { layer: String },

    /// Column not present in the flowline table
    #[error("Column '{column}' not found in flowline table")]
    ColumnNotFound { column: String },

    /// Column length does not match the number of flowline points
    #[error("Column '{column}' has {found} values but the flowline has {expected} points")]
    ColumnMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Coordinate axes cannot support the requested interpolation
    #[error("Interpolation domain error: {message}")]
    InterpolationDomain { message: String },

    /// Invalid run configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// NetCDF library error
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// TIFF decoding or encoding error
    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),
}

impl FlowlineError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    pub(crate) fn domain(message: impl Into<String>) -> Self {
        Self::InterpolationDomain {
            message: message.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Fails with [`FlowlineError::FileNotFound`] when `path` does not exist.
pub(crate) fn ensure_exists(path: &std::path::Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(FlowlineError::FileNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// Result type alias for flowline extraction
pub type Result<T> = std::result::Result<T, FlowlineError>;
