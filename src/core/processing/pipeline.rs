//! The run state machine:
//!
//! `Idle → MetadataFetched → GranuleSelected → HdfAcquired → ParameterPrepared
//!  → Converted → Merged → Georeferenced → Packaged → Done`
//!
//! Any failing transition moves the run to `Failed(stage)` and stops it.
//! Nothing is retried and nothing is cleaned up on failure: intermediate
//! files stay on disk for inspection. Only the final transition removes the
//! per-band rasters and the KML staging directory.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{NaiveDateTime, Utc};
use tracing::{error, info};

use crate::core::config::Config;
use crate::core::granule_id::{acquisition_stamp, companion_granule_id};
use crate::core::naming::RunProducts;
use crate::core::processing::merge::{georeference, merge_rgb};
use crate::core::selector::{Selection, select};
use crate::error::{Error, Result};
use crate::io::aoi::AreaOfInterest;
use crate::io::fetch::{GranuleDownloader, MetadataFetcher};
use crate::io::manifest::Manifest;
use crate::io::parameter_file::{ParameterValues, rewrite};
use crate::io::tools::{
    HegEnvironment, ToolInvoker, run_checked, superoverlay_conversion, swath_conversion,
};
use crate::io::writers::kmz::package_kmz;
use crate::types::{FetchStatus, PipelineStage, PipelineState, SelectionPolicy};

/// `<base><YYYY>/MYD03_<YYYY-MM-DD>.txt`
pub fn manifest_url(base_txt_url: &str, day: NaiveDateTime) -> String {
    format!(
        "{}{}{}",
        base_txt_url,
        day.format("%Y/"),
        day.format("MYD03_%Y-%m-%d.txt")
    )
}

/// `<base>/<granule file name>`
pub fn granule_url(base_hdf_url: &str, granule_file: &str) -> String {
    format!("{}/{}", base_hdf_url.trim_end_matches('/'), granule_file)
}

fn fetch_result(status: FetchStatus, url: String) -> Result<()> {
    match status {
        FetchStatus::Ok => Ok(()),
        FetchStatus::NotFound => Err(Error::FetchNotFound { url }),
        FetchStatus::Failed(code) => Err(Error::FetchFailed { url, code }),
    }
}

/// External capabilities a run depends on; tests substitute fakes.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub metadata: &'a dyn MetadataFetcher,
    pub downloader: &'a dyn GranuleDownloader,
    pub tools: &'a dyn ToolInvoker,
}

/// Artifacts accumulated while a run advances.
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub selection: Option<Selection>,
    /// Companion (reflectance) product file name.
    pub granule_file: Option<String>,
    pub hdf_path: Option<PathBuf>,
    pub products: Option<RunProducts>,
    /// Whether the HDF was already on disk and the download was skipped.
    pub download_skipped: bool,
}

pub struct Pipeline<'a> {
    config: &'a Config,
    collaborators: Collaborators<'a>,
    run_time: NaiveDateTime,
    policy: SelectionPolicy,
    state: PipelineState,
    run: PipelineRun,
}

impl<'a> Pipeline<'a> {
    /// A run for `test_time` when configured, otherwise for the current UTC time.
    pub fn new(config: &'a Config, collaborators: Collaborators<'a>) -> Result<Self> {
        let policy = config.selection_policy()?;
        let run_time = match policy {
            SelectionPolicy::ClosestTo(t) => t,
            SelectionPolicy::Latest => Utc::now().naive_utc(),
        };
        Ok(Self {
            config,
            collaborators,
            run_time,
            policy,
            state: PipelineState::Idle,
            run: PipelineRun::default(),
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn run_state(&self) -> &PipelineRun {
        &self.run
    }

    pub fn run_time(&self) -> NaiveDateTime {
        self.run_time
    }

    /// Advance until `Done` or the first failure.
    pub fn run(&mut self) -> Result<RunProducts> {
        while !self.state.is_terminal() {
            self.step()?;
        }
        self.products().cloned()
    }

    /// Advance until `target` is reached (or the run ends).
    pub fn run_until(&mut self, target: PipelineState) -> Result<PipelineState> {
        while self.state != target && !self.state.is_terminal() {
            self.step()?;
        }
        Ok(self.state)
    }

    /// Perform one transition.
    pub fn step(&mut self) -> Result<PipelineState> {
        let Some(stage) = self.state.next_stage() else {
            return Ok(self.state);
        };
        info!("Stage: {}", stage);
        let outcome = match stage {
            PipelineStage::FetchMetadata => self.fetch_metadata(),
            PipelineStage::SelectGranule => self.select_granule(),
            PipelineStage::AcquireHdf => self.acquire_hdf(),
            PipelineStage::PrepareParameters => self.prepare_parameters(),
            PipelineStage::Convert => self.convert(),
            PipelineStage::Merge => self.merge(),
            PipelineStage::Georeference => self.georeference(),
            PipelineStage::Package => self.package(),
            PipelineStage::Cleanup => self.cleanup(),
        };
        match outcome {
            Ok(next) => {
                self.state = next;
                Ok(next)
            }
            Err(e) => {
                error!("{} failed: {}", stage, e);
                self.state = PipelineState::Failed(stage);
                Err(e)
            }
        }
    }

    fn selection(&self) -> Result<&Selection> {
        self.run
            .selection
            .as_ref()
            .ok_or_else(|| Error::Processing("no granule selected".to_string()))
    }

    fn products(&self) -> Result<&RunProducts> {
        self.run
            .products
            .as_ref()
            .ok_or_else(|| Error::Processing("run products not named yet".to_string()))
    }

    fn fetch_metadata(&mut self) -> Result<PipelineState> {
        let destination = &self.config.lance.metadata_file;
        ensure_parent(destination)?;
        let url = manifest_url(&self.config.lance.base_txt_url, self.run_time);
        let status = self.collaborators.metadata.fetch_manifest(&url, destination)?;
        fetch_result(status, url)?;
        Ok(PipelineState::MetadataFetched)
    }

    fn select_granule(&mut self) -> Result<PipelineState> {
        let aoi = AreaOfInterest::from_kml(&self.config.bounding_box.kml_aoi_file)?;
        let records = Manifest::new(&self.config.lance.metadata_file).records()?;
        let selection = select(records, &aoi, self.policy)?;
        self.run.selection = Some(selection);
        Ok(PipelineState::GranuleSelected)
    }

    fn acquire_hdf(&mut self) -> Result<PipelineState> {
        let granule_file = companion_granule_id(&self.selection()?.granule.granule_id)?;
        info!("Found matching MODIS image: {}", granule_file);
        let folder = &self.config.lance.download_hdf_folder;
        let hdf_path = folder.join(&granule_file);

        if hdf_path.is_file() {
            info!("{:?} already downloaded; skipping fetch", hdf_path);
            self.run.download_skipped = true;
        } else {
            fs::create_dir_all(folder)?;
            let url = granule_url(&self.config.lance.base_hdf_url, &granule_file);
            let status = self.collaborators.downloader.download_granule(&url, folder)?;
            fetch_result(status, url.clone())?;
            if !hdf_path.is_file() {
                return Err(Error::FetchFailed { url, code: Some(0) });
            }
        }

        self.run.granule_file = Some(granule_file);
        self.run.hdf_path = Some(hdf_path);
        Ok(PipelineState::HdfAcquired)
    }

    fn prepare_parameters(&mut self) -> Result<PipelineState> {
        let granule_file = self
            .run
            .granule_file
            .as_deref()
            .ok_or_else(|| Error::Processing("no granule acquired".to_string()))?;
        let stamp = acquisition_stamp(granule_file)?;
        info!("Extracted acquisition time from HDF filename: {}", stamp);
        let products = RunProducts::new(self.config, &stamp);

        fs::create_dir_all(&self.config.paths.geotiff_folder)?;
        let hdf_path = self
            .run
            .hdf_path
            .as_ref()
            .ok_or_else(|| Error::Processing("no granule acquired".to_string()))?;
        let input = hdf_path.to_string_lossy();
        let outputs: Vec<String> = products
            .band_rasters
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        let bbox = &self.selection()?.bbox;
        rewrite(
            &self.config.paths.parameter_file,
            &ParameterValues {
                input_filename: &input,
                output_filenames: &outputs,
                ul_corner: &bbox.upper_left,
                lr_corner: &bbox.lower_right,
            },
        )?;

        self.run.products = Some(products);
        Ok(PipelineState::ParameterPrepared)
    }

    fn convert(&mut self) -> Result<PipelineState> {
        let heg = &self.config.hegtool;
        let env = HegEnvironment {
            working_dir: heg.directory.clone(),
            mrtbindir: heg.mrtbindir.clone(),
            pgshome: heg.pgshome.clone(),
            mrtdatadir: heg.mrtdatadir.clone(),
        };
        let invocation = swath_conversion(&heg.program, &self.config.paths.parameter_file, &env);
        run_checked(self.collaborators.tools, &invocation)?;
        Ok(PipelineState::Converted)
    }

    fn merge(&mut self) -> Result<PipelineState> {
        let products = self.products()?;
        merge_rgb(&products.band_rasters, &products.merged)?;
        Ok(PipelineState::Merged)
    }

    fn georeference(&mut self) -> Result<PipelineState> {
        let products = self.products()?;
        let source = products
            .band_rasters
            .first()
            .ok_or_else(|| Error::Processing("no band rasters".to_string()))?;
        georeference(&products.merged, &products.georeferenced, source)?;
        Ok(PipelineState::Georeferenced)
    }

    fn package(&mut self) -> Result<PipelineState> {
        let products = self.products()?;
        remove_dir_if_exists(&products.kml_staging_dir)?;
        fs::create_dir_all(&products.kml_staging_dir)?;

        let invocation = superoverlay_conversion(
            &self.config.paths.gdal_translate,
            &products.georeferenced,
            &products.kml,
        );
        run_checked(self.collaborators.tools, &invocation)?;
        package_kmz(&products.kml_staging_dir, &products.kmz)?;
        Ok(PipelineState::Packaged)
    }

    fn cleanup(&mut self) -> Result<PipelineState> {
        let products = self.products()?;
        for band in &products.band_rasters {
            remove_file_if_exists(band)?;
        }
        remove_dir_if_exists(&products.kml_staging_dir)?;
        info!("Run complete: {:?}", products.kmz);
        Ok(PipelineState::Done)
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn remove_file_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn remove_dir_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_dir_all(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
