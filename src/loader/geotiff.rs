//! Single-band GeoTIFF loading
//!
//! Only the first band is read. Georeferencing comes from the
//! ModelPixelScale + ModelTiepoint tags, or from ModelTransformation when
//! those are absent. PixelIsPoint rasters are shifted to corner registration
//! the way GDAL does. Cells equal to [`SENTINEL`] become NaN, and the loaded
//! set carries both the raw grid and its gap-filled counterpart.

use super::LoadOutcome;
use crate::errors::{ensure_exists, FlowlineError, Result};
use crate::gap_fill::{fill_gaps, FillOutcome, GapFillOptions};
use crate::grid::{normalize_sentinel, GeoTransform, LayerSet, SENTINEL};
use ndarray::Array2;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tracing::{debug, info};

/// Layer holding the raster as read, with sentinels normalized to NaN
pub const RAW_LAYER: &str = "grid";
/// Layer holding the gap-filled raster
pub const FILLED_LAYER: &str = "grid_interpolated";

const MODEL_PIXEL_SCALE: Tag = Tag::Unknown(33550);
const MODEL_TIEPOINT: Tag = Tag::Unknown(33922);
const MODEL_TRANSFORMATION: Tag = Tag::Unknown(34264);
const GEO_KEY_DIRECTORY: Tag = Tag::Unknown(34735);

const GT_RASTER_TYPE_KEY: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;

/// Load a GeoTIFF and gap fill it
///
/// # Errors
///
/// Returns [`FlowlineError::FileNotFound`] for a missing file and
/// [`FlowlineError::Format`] when the raster lacks georeferencing or its
/// sample layout is not understood.
pub fn load_geotiff(path: &Path, gap_fill: &GapFillOptions) -> Result<LoadOutcome> {
    let (transform, grid) = read_geotiff(path)?;
    let (ny, nx) = grid.dim();

    let mut layers = LayerSet::new(transform.easting_axis(nx), transform.northing_axis(ny));
    let outcome = fill_gaps(&grid, gap_fill)?;
    layers.insert(RAW_LAYER, grid)?;

    info!("Loaded {}x{} raster from {}", nx, ny, path.display());

    Ok(match outcome {
        FillOutcome::Complete(filled) => {
            layers.insert(FILLED_LAYER, filled)?;
            LoadOutcome::Loaded(layers)
        }
        FillOutcome::Residual { grid, cells } => {
            layers.insert(FILLED_LAYER, grid)?;
            LoadOutcome::Degraded {
                layers,
                residual_cells: cells,
            }
        }
    })
}

/// Read band 1 and the geotransform of a GeoTIFF
///
/// The grid is `[row, column]` in file order with [`SENTINEL`] cells set to NaN.
pub fn read_geotiff(path: &Path) -> Result<(GeoTransform, Array2<f64>)> {
    ensure_exists(path)?;
    let file = File::open(path)?;
    let mut decoder = Decoder::new(BufReader::new(file))?;

    // DEM mosaics exceed the decoder's default buffer limits
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024;
    limits.intermediate_buffer_size = 1024 * 1024 * 1024;
    limits.ifd_value_size = 1024 * 1024 * 1024;
    decoder = decoder.with_limits(limits);

    let (width, height) = decoder.dimensions()?;
    let (width, height) = (width as usize, height as usize);
    let samples = decoder.get_tag_u32(Tag::SamplesPerPixel).unwrap_or(1) as usize;
    if samples == 0 {
        return Err(FlowlineError::format(format!(
            "{} declares zero samples per pixel",
            path.display()
        )));
    }

    let transform = read_transform(&mut decoder, path)?;
    let data = decode_samples(decoder.read_image()?);

    if data.len() != width * height * samples {
        return Err(FlowlineError::format(format!(
            "{} holds {} samples, expected {} for {}x{} pixels with {} bands",
            path.display(),
            data.len(),
            width * height * samples,
            width,
            height,
            samples
        )));
    }

    let band: Vec<f64> = data.into_iter().step_by(samples).collect();
    let mut grid = Array2::from_shape_vec((height, width), band)?;
    normalize_sentinel(&mut grid, SENTINEL);

    Ok((transform, grid))
}

/// Georeferencing with the origin moved to the outer corner of pixel (0, 0)
///
/// PixelIsPoint rasters tie the model coordinates to the pixel centre, so the
/// origin is shifted back by half a pixel on both axes.
fn read_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<GeoTransform> {
    let transform = read_model_transform(decoder, path)?;
    if pixel_is_point(decoder) {
        debug!("{} is PixelIsPoint, shifting origin by half a pixel", path.display());
        return Ok(GeoTransform::new(
            transform.origin_x - 0.5 * transform.pixel_width,
            transform.origin_y - 0.5 * transform.pixel_height,
            transform.pixel_width,
            transform.pixel_height,
        ));
    }
    Ok(transform)
}

/// GTRasterTypeGeoKey from the GeoKey directory; absent means PixelIsArea
fn pixel_is_point<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> bool {
    let Ok(keys) = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY) else {
        return false;
    };
    // Header [version, revision, minor, count], then [id, location, count, value] per key
    let count = keys.get(3).copied().unwrap_or(0) as usize;
    keys.get(4..)
        .unwrap_or(&[])
        .chunks_exact(4)
        .take(count)
        .any(|key| key[0] == GT_RASTER_TYPE_KEY && key[1] == 0 && key[3] == RASTER_PIXEL_IS_POINT)
}

fn read_model_transform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    path: &Path,
) -> Result<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE);
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT);

    if let (Ok(scale), Ok(tiepoint)) = (scale, tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // Tiepoint: raster (i, j, k) maps to model (x, y, z)
            let (i, j) = (tiepoint[0], tiepoint[1]);
            let (x, y) = (tiepoint[3], tiepoint[4]);
            return Ok(GeoTransform::new(
                x - i * scale[0],
                y + j * scale[1],
                scale[0],
                -scale[1],
            ));
        }
    }

    if let Ok(matrix) = decoder.get_tag_f64_vec(MODEL_TRANSFORMATION) {
        if matrix.len() >= 16 {
            if matrix[1] != 0.0 || matrix[4] != 0.0 {
                return Err(FlowlineError::format(format!(
                    "{} is rotated, only north-up rasters are supported",
                    path.display()
                )));
            }
            return Ok(GeoTransform::new(matrix[3], matrix[7], matrix[0], matrix[5]));
        }
    }

    Err(FlowlineError::format(format!(
        "{} has no GeoTIFF georeferencing tags",
        path.display()
    )))
}

fn decode_samples(result: DecodingResult) -> Vec<f64> {
    match result {
        DecodingResult::F32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::F64(data) => data,
        DecodingResult::I8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f64).collect(),
        DecodingResult::U8(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U16(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U32(data) => data.into_iter().map(f64::from).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f64).collect(),
    }
}
