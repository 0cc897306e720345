//! File names of everything a run produces, all stamped with the
//! acquisition time of the selected granule.
use std::path::{Path, PathBuf};

use crate::core::config::Config;

/// Name of the KML staging directory inside the KMZ folder.
pub const KML_STAGING_DIR: &str = "tmp";

#[derive(Debug, Clone, PartialEq)]
pub struct RunProducts {
    /// `YYYY-MM-DD_HHMM`
    pub stamp: String,
    /// Per-band rasters written by the swath tool, in template order.
    pub band_rasters: Vec<PathBuf>,
    pub merged: PathBuf,
    pub georeferenced: PathBuf,
    pub kml_staging_dir: PathBuf,
    pub kml: PathBuf,
    pub kmz: PathBuf,
}

impl RunProducts {
    pub fn new(config: &Config, stamp: &str) -> Self {
        let band_rasters = band_output_paths(
            &config.paths.geotiff_folder,
            &config.names.base_filenames,
            stamp,
        );
        let kml_staging_dir = config.paths.kmz_folder.join(KML_STAGING_DIR);
        Self {
            stamp: stamp.to_string(),
            band_rasters,
            merged: config.paths.tiff_final.join(format!("{}_aqua.tif", stamp)),
            georeferenced: config
                .paths
                .tiff_final
                .join(format!("{}_aqua_georef.tif", stamp)),
            kml: kml_staging_dir.join(format!("{}_aqua.kml", stamp)),
            kml_staging_dir,
            kmz: config.paths.kmz_folder.join(format!("{}_aqua.kmz", stamp)),
        }
    }
}

/// `<folder>/<stamp>_MODIS_SWATH_TYPE_L2_<base>` for every base name.
pub fn band_output_paths(folder: &Path, base_filenames: &[String], stamp: &str) -> Vec<PathBuf> {
    base_filenames
        .iter()
        .map(|base| folder.join(format!("{}_MODIS_SWATH_TYPE_L2_{}", stamp, base.trim())))
        .collect()
}
