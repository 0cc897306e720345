use gdal::raster::{Buffer, ColorInterpretation};
use gdal::{Dataset, DatasetOptions, DriverManager, GdalOpenFlags};
use ndarray::Array2;
use std::path::Path;

use crate::io::gdal::GdalError;

const RGB_ROLES: [ColorInterpretation; 3] = [
    ColorInterpretation::RedBand,
    ColorInterpretation::GreenBand,
    ColorInterpretation::BlueBand,
];

/// Write three u8 bands as an RGB GeoTIFF with red/green/blue color roles.
pub fn write_tiff_rgb_u8(
    output: &Path,
    bands: &[Array2<u8>],
    nodata: u8,
    geotransform: Option<[f64; 6]>,
    projection: &str,
) -> Result<Dataset, GdalError> {
    if bands.len() != RGB_ROLES.len() {
        return Err(GdalError::UnsupportedFormat(format!(
            "RGB output needs 3 bands, got {}",
            bands.len()
        )));
    }
    let (rows, cols) = bands[0].dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut ds = driver.create_with_band_type::<u8, _>(output, cols, rows, RGB_ROLES.len())?;

    for (idx, (data, role)) in bands.iter().zip(RGB_ROLES).enumerate() {
        if data.dim() != (rows, cols) {
            return Err(GdalError::DimensionMismatch(
                cols,
                rows,
                data.ncols(),
                data.nrows(),
            ));
        }
        let mut band = ds.rasterband(idx + 1)?;
        band.set_color_interpretation(role)?;
        band.set_no_data_value(Some(nodata as f64))?;
        let mut buf = Buffer::new((cols, rows), data.iter().copied().collect::<Vec<u8>>());
        band.write((0, 0), (cols, rows), &mut buf)?;
    }

    if let Some(gt) = geotransform {
        ds.set_geo_transform(&gt)?;
    }
    if !projection.is_empty() {
        ds.set_projection(projection)?;
    }
    Ok(ds)
}

/// Overwrite the geotransform and projection of an existing raster in place.
pub fn set_georeference(
    target: &Path,
    geotransform: Option<[f64; 6]>,
    projection: &str,
) -> Result<(), GdalError> {
    let mut ds = Dataset::open_ex(
        target,
        DatasetOptions {
            open_flags: GdalOpenFlags::GDAL_OF_UPDATE | GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        },
    )?;
    if let Some(gt) = geotransform {
        ds.set_geo_transform(&gt)?;
    }
    if !projection.is_empty() {
        ds.set_projection(projection)?;
    }
    Ok(())
}
