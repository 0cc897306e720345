//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Every variant is fatal to a pipeline run; the only recovery the pipeline
//! performs is skipping a download whose target already exists.
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not load area of interest from {path:?}: {reason}")]
    GeometryLoad { path: PathBuf, reason: String },

    #[error("No day granule in the manifest intersects the area of interest")]
    NoGranuleFound,

    #[error("Malformed granule id `{id}`: expected at least {expected} ASCII characters")]
    MalformedGranuleId { id: String, expected: usize },

    #[error("Remote resource not found (it may not be published yet): {url}")]
    FetchNotFound { url: String },

    #[error("Fetch failed for {url} (exit code {code:?})")]
    FetchFailed { url: String, code: Option<i32> },

    #[error("External tool `{tool}` failed (exit code {code:?})")]
    ExternalTool { tool: String, code: Option<i32> },

    #[error("Parameter template needs more than {supplied} OUTPUT_FILENAME values")]
    InsufficientOutputNames { supplied: usize },

    #[error("Manifest error: {0}")]
    Manifest(#[from] csv::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] crate::io::GdalError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Processing error: {0}")]
    Processing(String),
}

impl Error {
    pub fn config<E: std::fmt::Display>(e: E) -> Self {
        Error::Config(e.to_string())
    }
}
