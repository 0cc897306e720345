//! Authenticated retrieval through an external fetch utility (wget).
//!
//! Transfers are delegated entirely to the utility; only its exit code is
//! interpreted (see [`FetchStatus::from_exit_code`]).
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use crate::error::Result;
use crate::types::FetchStatus;

/// Downloads the daily manifest to a fixed file.
pub trait MetadataFetcher {
    fn fetch_manifest(&self, url: &str, destination: &Path) -> Result<FetchStatus>;
}

/// Downloads a granule container into a directory, keeping its remote name.
pub trait GranuleDownloader {
    fn download_granule(&self, url: &str, directory: &Path) -> Result<FetchStatus>;
}

/// wget with an `Authorization: Bearer` header.
#[derive(Debug, Clone)]
pub struct WgetFetcher {
    program: PathBuf,
    auth_token: String,
}

impl WgetFetcher {
    pub fn new<P: Into<PathBuf>>(program: P, auth_token: &str) -> Self {
        Self {
            program: program.into(),
            auth_token: auth_token.to_string(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Authorization: Bearer {}", self.auth_token)
    }

    /// Arguments for one transfer; `target_flag` is `-O` (file) or `-P` (directory).
    pub fn arguments(&self, url: &str, target_flag: &str, target: &Path) -> Vec<OsString> {
        vec![
            url.into(),
            "--header".into(),
            self.auth_header().into(),
            target_flag.into(),
            target.as_os_str().to_os_string(),
        ]
    }

    fn run(&self, url: &str, target_flag: &str, target: &Path) -> Result<FetchStatus> {
        info!("Fetching {}", url);
        let status = Command::new(&self.program)
            .args(self.arguments(url, target_flag, target))
            .status()?;
        let outcome = FetchStatus::from_exit_code(status.code());
        match outcome {
            FetchStatus::Ok => info!("Fetched {} -> {:?}", url, target),
            FetchStatus::NotFound => warn!("{} not found; it may not be available yet", url),
            FetchStatus::Failed(code) => warn!("Fetching {} failed (exit code {:?})", url, code),
        }
        Ok(outcome)
    }
}

impl MetadataFetcher for WgetFetcher {
    fn fetch_manifest(&self, url: &str, destination: &Path) -> Result<FetchStatus> {
        self.run(url, "-O", destination)
    }
}

impl GranuleDownloader for WgetFetcher {
    fn download_granule(&self, url: &str, directory: &Path) -> Result<FetchStatus> {
        self.run(url, "-P", directory)
    }
}
