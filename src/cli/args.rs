use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "modisnrt",
    version,
    about = "Fetch today's MODIS Aqua granule over the area of interest and package it as KMZ"
)]
pub struct CliArgs {
    /// Path to the TOML configuration file
    pub config: PathBuf,
}
