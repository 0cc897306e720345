//! In-place rewriting of the swath tool's parameter template.
//!
//! The template is line oriented (`KEY = value`). Four keys are rewritten;
//! everything else passes through byte for byte. The tool only accepts LF
//! terminators and fails without a useful message on CRLF, so every rewrite
//! is followed by a raw byte pass that normalizes line endings.
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};

pub const INPUT_FILENAME: &str = "INPUT_FILENAME";
pub const OUTPUT_FILENAME: &str = "OUTPUT_FILENAME";
pub const SPATIAL_SUBSET_UL_CORNER: &str = "SPATIAL_SUBSET_UL_CORNER";
pub const SPATIAL_SUBSET_LR_CORNER: &str = "SPATIAL_SUBSET_LR_CORNER";

const WINDOWS_LINE_ENDING: &[u8] = b"\r\n";
const UNIX_LINE_ENDING: &[u8] = b"\n";

/// Values substituted into the template.
#[derive(Debug, Clone)]
pub struct ParameterValues<'a> {
    pub input_filename: &'a str,
    /// Consumed in file order by successive OUTPUT_FILENAME lines.
    pub output_filenames: &'a [String],
    pub ul_corner: &'a str,
    pub lr_corner: &'a str,
}

/// Rewrite template text; returns the new text without touching the disk.
pub fn rewrite_text(template: &str, values: &ParameterValues<'_>) -> Result<String> {
    let mut outputs = values.output_filenames.iter();
    let mut out = String::with_capacity(template.len());

    for line in template.split_inclusive('\n') {
        let key = line.trim_start();
        if key.starts_with(INPUT_FILENAME) {
            out.push_str(&format!("{} = {}\n", INPUT_FILENAME, values.input_filename));
        } else if key.starts_with(OUTPUT_FILENAME) {
            let name = outputs.next().ok_or(Error::InsufficientOutputNames {
                supplied: values.output_filenames.len(),
            })?;
            out.push_str(&format!("{} = {}\n", OUTPUT_FILENAME, name));
        } else if key.starts_with(SPATIAL_SUBSET_UL_CORNER) {
            out.push_str(&format!(
                "{} = {}\n",
                SPATIAL_SUBSET_UL_CORNER, values.ul_corner
            ));
        } else if key.starts_with(SPATIAL_SUBSET_LR_CORNER) {
            out.push_str(&format!(
                "{} = {}\n",
                SPATIAL_SUBSET_LR_CORNER, values.lr_corner
            ));
        } else {
            out.push_str(line);
        }
    }

    let unused = outputs.len();
    if unused > 0 {
        debug!("{} output filename(s) not referenced by the template", unused);
    }
    Ok(out)
}

/// Rewrite the template file in place, then normalize its line endings.
pub fn rewrite(template_path: &Path, values: &ParameterValues<'_>) -> Result<()> {
    let template = fs::read_to_string(template_path)?;
    let rewritten = rewrite_text(&template, values)?;
    fs::write(template_path, rewritten)?;
    info!("Parameter file {:?} has been modified", template_path);
    convert_windows_to_unix_line_endings(template_path)
}

/// Replace every CRLF in the file with LF.
pub fn convert_windows_to_unix_line_endings(path: &Path) -> Result<()> {
    let content = fs::read(path)?;
    let converted = replace_line_endings(&content);
    if converted.len() != content.len() {
        debug!(
            "Converted {} CRLF terminator(s) in {:?}",
            content.len() - converted.len(),
            path
        );
    }
    fs::write(path, converted)?;
    Ok(())
}

fn replace_line_endings(content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;
    while i < content.len() {
        if content[i..].starts_with(WINDOWS_LINE_ENDING) {
            out.extend_from_slice(UNIX_LINE_ENDING);
            i += WINDOWS_LINE_ENDING.len();
        } else {
            out.push(content[i]);
            i += 1;
        }
    }
    out
}
