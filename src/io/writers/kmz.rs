//! KMZ packaging: zip a KML superoverlay directory and give it a `.kmz` name.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::Result;

/// Archive everything under `source_dir` (paths relative to it) into `kmz_path`.
///
/// The archive is written next to the target as `<name>.zip` and renamed once
/// complete, so an interrupted run never leaves a truncated `.kmz` behind.
pub fn package_kmz(source_dir: &Path, kmz_path: &Path) -> Result<PathBuf> {
    let mut staging = kmz_path.as_os_str().to_os_string();
    staging.push(".zip");
    let staging = PathBuf::from(staging);

    let mut writer = ZipWriter::new(File::create(&staging)?);
    let options = SimpleFileOptions::default();
    let mut files = 0usize;
    add_directory(&mut writer, source_dir, source_dir, options, &mut files)?;
    writer.finish()?;

    fs::rename(&staging, kmz_path)?;
    info!("Packaged {} file(s) into {:?}", files, kmz_path);
    Ok(kmz_path.to_path_buf())
}

fn add_directory(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: SimpleFileOptions,
    files: &mut usize,
) -> Result<()> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<io::Result<_>>()?;
    entries.sort();

    for path in entries {
        let name = archive_name(root, &path);
        if path.is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
            add_directory(writer, root, &path, options, files)?;
        } else {
            writer.start_file(name, options)?;
            writer.write_all(&fs::read(&path)?)?;
            *files += 1;
        }
    }
    Ok(())
}

/// Forward-slash path of `path` relative to `root`.
fn archive_name(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
