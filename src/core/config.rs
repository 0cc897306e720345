//! Run configuration loaded from a sectioned TOML file.
//!
//! ```toml
//! [paths]
//! parameter_file = "~/heg/Template_swath.prm"
//! geotiff_folder = "~/modis/bands"
//! tiff_final = "~/modis/final"
//! kmz_folder = "~/modis/kmz"
//! gdal_translate = "gdal_translate"
//!
//! [names]
//! base_filenames = ["band1.tif", "band4.tif", "band3.tif"]
//!
//! [hegtool]
//! directory = "~/HEG/bin"
//! mrtbindir = "~/HEG/bin"
//! pgshome = "~/HEG/TOOLKIT_MTD"
//! mrtdatadir = "~/HEG/data"
//!
//! [lance]
//! auth_token = "..."
//! download_hdf_folder = "~/modis/hdf"
//! metadata_file = "~/modis/MYD03_today.txt"
//! base_txt_url = "https://nrt3.modaps.eosdis.nasa.gov/api/v2/content/details/allData/61/MYD03/"
//! base_hdf_url = "https://nrt3.modaps.eosdis.nasa.gov/api/v2/content/archives/allData/61/MYD09/Recent"
//! test_time = "2024-03-28 20:30"
//!
//! [bounding_box]
//! kml_aoi_file = "~/modis/aoi.kml"
//! ```
use std::fs;
use std::path::{Component, Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::SelectionPolicy;

/// Number of band rasters the swath tool writes and the merge consumes.
pub const BAND_COUNT: usize = 3;

const TEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

fn default_gdal_translate() -> PathBuf {
    PathBuf::from("gdal_translate")
}

fn default_swath_program() -> PathBuf {
    PathBuf::from("swtif")
}

fn default_wget() -> PathBuf {
    PathBuf::from("wget")
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    pub parameter_file: PathBuf,
    pub geotiff_folder: PathBuf,
    pub tiff_final: PathBuf,
    pub kmz_folder: PathBuf,
    #[serde(default = "default_gdal_translate")]
    pub gdal_translate: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamesSection {
    /// Band output basenames, in the order of the template's OUTPUT_FILENAME lines.
    pub base_filenames: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HegToolSection {
    /// Working directory for the swath tool.
    pub directory: PathBuf,
    #[serde(default = "default_swath_program")]
    pub program: PathBuf,
    pub mrtbindir: PathBuf,
    pub pgshome: PathBuf,
    pub mrtdatadir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LanceSection {
    pub auth_token: String,
    pub download_hdf_folder: PathBuf,
    pub metadata_file: PathBuf,
    pub base_txt_url: String,
    pub base_hdf_url: String,
    /// Replay a past day; also switches selection to closest-in-time.
    #[serde(default)]
    pub test_time: Option<String>,
    #[serde(default = "default_wget")]
    pub wget: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoundingBoxSection {
    pub kml_aoi_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub paths: PathsSection,
    pub names: NamesSection,
    pub hegtool: HegToolSection,
    pub lance: LanceSection,
    pub bounding_box: BoundingBoxSection,
}

impl Config {
    /// Read, parse, expand `~` and validate a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_tilde(path.as_ref());
        let text = fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {:?}: {}", path, e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(text).map_err(Error::config)?;
        config.resolve_paths()?;
        config.validate()?;
        Ok(config)
    }

    /// Expand `~` and anchor every path at the current directory. The swath
    /// tool runs in its own working directory, so a relative path would name
    /// a different file for it than for this process. Bare command names are
    /// left for `PATH` lookup.
    fn resolve_paths(&mut self) -> Result<()> {
        for p in [
            &mut self.paths.parameter_file,
            &mut self.paths.geotiff_folder,
            &mut self.paths.tiff_final,
            &mut self.paths.kmz_folder,
            &mut self.hegtool.directory,
            &mut self.hegtool.mrtbindir,
            &mut self.hegtool.pgshome,
            &mut self.hegtool.mrtdatadir,
            &mut self.lance.download_hdf_folder,
            &mut self.lance.metadata_file,
            &mut self.bounding_box.kml_aoi_file,
        ] {
            *p = absolute_path(p)?;
        }
        for p in [
            &mut self.paths.gdal_translate,
            &mut self.hegtool.program,
            &mut self.lance.wget,
        ] {
            if !is_bare_command(p) {
                *p = absolute_path(p)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.names.base_filenames.len() != BAND_COUNT {
            return Err(Error::Config(format!(
                "names.base_filenames must list {} band files, got {}",
                BAND_COUNT,
                self.names.base_filenames.len()
            )));
        }
        if self
            .names
            .base_filenames
            .iter()
            .any(|n| n.trim().is_empty())
        {
            return Err(Error::Config(
                "names.base_filenames contains an empty name".to_string(),
            ));
        }
        if self.lance.auth_token.trim().is_empty() {
            return Err(Error::Config("lance.auth_token is empty".to_string()));
        }
        if self.lance.auth_token.contains("Bearer") {
            return Err(Error::Config(
                "lance.auth_token must be the bare token, without `Authorization: Bearer`"
                    .to_string(),
            ));
        }
        self.test_time()?;
        Ok(())
    }

    /// Parsed `lance.test_time`, treating an empty string as unset.
    pub fn test_time(&self) -> Result<Option<NaiveDateTime>> {
        match self.lance.test_time.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => NaiveDateTime::parse_from_str(raw, TEST_TIME_FORMAT)
                .map(Some)
                .map_err(|e| {
                    Error::Config(format!(
                        "lance.test_time `{}` is not `{}`: {}",
                        raw, TEST_TIME_FORMAT, e
                    ))
                }),
        }
    }

    pub fn selection_policy(&self) -> Result<SelectionPolicy> {
        Ok(match self.test_time()? {
            Some(t) => SelectionPolicy::ClosestTo(t),
            None => SelectionPolicy::Latest,
        })
    }
}

/// `~` expansion followed by anchoring at the current directory.
fn absolute_path(path: &Path) -> Result<PathBuf> {
    std::path::absolute(expand_tilde(path))
        .map_err(|e| Error::Config(format!("cannot resolve path {:?}: {}", path, e)))
}

/// A single plain component such as `wget`, resolved through `PATH`.
fn is_bare_command(path: &Path) -> bool {
    let mut components = path.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(name)), None) if name != "~"
    )
}

/// Replace a leading `~` with the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}
