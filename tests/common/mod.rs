//! Synthetic GeoTIFF, NetCDF and flowline fixtures shared by the integration tests

#![allow(dead_code)]

use ndarray::{Array1, Array2, Array3};
use netcdf::create;
use std::fs::File;
use std::path::Path;
use tiff::encoder::{colortype, TiffEncoder};
use tiff::tags::Tag;

/// GTRasterTypeGeoKey value for area (corner) registration
pub const PIXEL_IS_AREA: u16 = 1;
/// GTRasterTypeGeoKey value for point (centre) registration
pub const PIXEL_IS_POINT: u16 = 2;

/// Write a single-band Float32 GeoTIFF whose top-left corner is `(origin_x, origin_y)`
pub fn write_geotiff(path: &Path, grid: &Array2<f32>, origin: (f64, f64), pixel: f64) {
    write_registered_geotiff(path, grid, origin, pixel, PIXEL_IS_AREA);
}

/// Write a single-band Float32 GeoTIFF tied at `origin` with the given raster type
pub fn write_registered_geotiff(
    path: &Path,
    grid: &Array2<f32>,
    origin: (f64, f64),
    pixel: f64,
    raster_type: u16,
) {
    let (rows, cols) = grid.dim();
    let file = File::create(path).expect("Failed to create GeoTIFF");
    let mut tiff = TiffEncoder::new(file).expect("Failed to create TIFF encoder");
    let mut image = tiff
        .new_image::<colortype::Gray32Float>(cols as u32, rows as u32)
        .expect("Failed to start image");

    image
        .encoder()
        .write_tag(Tag::Unknown(33550), &[pixel, pixel, 0.0][..])
        .expect("Failed to write ModelPixelScale");
    image
        .encoder()
        .write_tag(
            Tag::Unknown(33922),
            &[0.0, 0.0, 0.0, origin.0, origin.1, 0.0][..],
        )
        .expect("Failed to write ModelTiepoint");
    let geokeys: Vec<u16> = vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, raster_type];
    image
        .encoder()
        .write_tag(Tag::Unknown(34735), geokeys.as_slice())
        .expect("Failed to write GeoKeyDirectory");

    let data: Vec<f32> = grid.iter().copied().collect();
    image.write_data(&data).expect("Failed to write raster data");
}

/// Write `x`/`y` axes plus 2D `[y, x]` variables
pub fn write_netcdf_2d(path: &Path, x: &Array1<f64>, y: &Array1<f64>, vars: &[(&str, Array2<f64>)]) {
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("x", x.len()).expect("Failed to add dimension x");
    file.add_dimension("y", y.len()).expect("Failed to add dimension y");

    let mut var = file
        .add_variable::<f64>("x", &["x"])
        .expect("Failed to add x");
    var.put(x.view(), ..).expect("Failed to write x");
    let mut var = file
        .add_variable::<f64>("y", &["y"])
        .expect("Failed to add y");
    var.put(y.view(), ..).expect("Failed to write y");

    for (name, grid) in vars {
        let mut var = file
            .add_variable::<f64>(name, &["y", "x"])
            .expect("Failed to add variable");
        var.put(grid.view(), ..).expect("Failed to write variable");
    }
}

/// Write `x`/`y` axes plus 3D `[time, y, x]` float variables with a fill value
pub fn write_netcdf_3d(
    path: &Path,
    x: &Array1<f64>,
    y: &Array1<f64>,
    vars: &[(&str, Array3<f32>)],
    fill_value: f32,
) {
    let steps = vars.first().map(|(_, a)| a.dim().0).unwrap_or(1);
    let mut file = create(path).expect("Failed to create NetCDF file");
    file.add_dimension("time", steps)
        .expect("Failed to add dimension time");
    file.add_dimension("x", x.len()).expect("Failed to add dimension x");
    file.add_dimension("y", y.len()).expect("Failed to add dimension y");

    let mut var = file
        .add_variable::<f64>("x", &["x"])
        .expect("Failed to add x");
    var.put(x.view(), ..).expect("Failed to write x");
    let mut var = file
        .add_variable::<f64>("y", &["y"])
        .expect("Failed to add y");
    var.put(y.view(), ..).expect("Failed to write y");

    for (name, data) in vars {
        let mut var = file
            .add_variable::<f32>(name, &["time", "y", "x"])
            .expect("Failed to add variable");
        var.put_attribute("_FillValue", fill_value)
            .expect("Failed to set fill value");
        var.put(data.view(), ..).expect("Failed to write variable");
    }
}

/// Write a flowline CSV with an unnamed index column
pub fn write_flowline(path: &Path, points: &[(f64, f64, f64)]) {
    let mut text = String::from(",distance,easting,northing\n");
    for (i, (d, e, n)) in points.iter().enumerate() {
        text.push_str(&format!("{i},{d:?},{e:?},{n:?}\n"));
    }
    std::fs::write(path, text).expect("Failed to write flowline CSV");
}
