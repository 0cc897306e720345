pub mod kmz;
pub mod tiff;
