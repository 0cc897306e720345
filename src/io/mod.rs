//! I/O layer: manifest and AOI readers, the parameter file mutator, external
//! fetch and tool invocation, the GDAL raster reader, and `writers` for the
//! RGB GeoTIFF and KMZ outputs.
pub mod aoi;
pub use aoi::AreaOfInterest;

pub mod manifest;
pub use manifest::{GranuleRecord, Manifest};

pub mod parameter_file;

pub mod fetch;
pub use fetch::{GranuleDownloader, MetadataFetcher, WgetFetcher};

pub mod tools;
pub use tools::{ProcessInvoker, ToolInvocation, ToolInvoker};

pub mod gdal;
pub use gdal::{GdalError, RasterMetadata, RasterReader};

pub mod writers;
