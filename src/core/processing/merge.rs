use std::fs;
use std::path::Path;

use tracing::info;

use crate::core::processing::rescale::{RGB_NODATA, SWATH_NODATA, rescale_to_u8};
use crate::error::{Error, Result};
use crate::io::gdal::RasterReader;
use crate::io::writers::tiff::{set_georeference, write_tiff_rgb_u8};

/// Stack three single-band rasters into a byte-scaled RGB GeoTIFF.
///
/// The georeference of the first band is carried onto the output.
pub fn merge_rgb(band_paths: &[impl AsRef<Path>], output: &Path) -> Result<()> {
    if band_paths.len() != 3 {
        return Err(Error::Processing(format!(
            "RGB merge needs 3 band rasters, got {}",
            band_paths.len()
        )));
    }
    let mut bands = Vec::with_capacity(3);
    let mut reference = None;
    for path in band_paths {
        let reader = RasterReader::open(path.as_ref())?;
        bands.push(reader.read_band(1)?);
        if reference.is_none() {
            reference = Some(reader.metadata.clone());
        }
    }
    let reference = reference.ok_or_else(|| Error::Processing("no band metadata".to_string()))?;

    let scaled = rescale_to_u8(&bands, SWATH_NODATA)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    write_tiff_rgb_u8(
        output,
        &scaled,
        RGB_NODATA,
        reference.geotransform,
        &reference.projection,
    )?;
    info!("RGB image saved as {:?}", output);
    Ok(())
}

/// Copy `input` to `output` and stamp it with the georeference of `source`.
pub fn georeference(input: &Path, output: &Path, source: &Path) -> Result<()> {
    let reference = RasterReader::open(source)?.metadata;
    if reference.geotransform.is_none() && reference.projection.is_empty() {
        return Err(Error::Processing(format!(
            "{:?} carries no georeference to copy",
            source
        )));
    }
    fs::copy(input, output)?;
    set_georeference(output, reference.geotransform, &reference.projection)?;
    info!("Georeferencing complete: {:?}", output);
    Ok(())
}
