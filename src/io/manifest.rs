//! Reader for the daily LANCE geolocation manifest (`MYD03_<date>.txt`).
//!
//! The manifest is a CSV table preceded by a short free-text preamble. Each
//! data row describes one granule: its id, start time, day/night flag and the
//! four corners of its ground footprint (`GRingLongitude1..4`,
//! `GRingLatitude1..4`). Rows that cannot be turned into a [`GranuleRecord`]
//! are skipped with a warning so one damaged line never hides the rest of
//! the day.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter, Trim};
use tracing::{debug, warn};

use crate::error::Result;
use crate::types::DayNightFlag;

/// Number of non-tabular lines before the header row.
pub const PREAMBLE_LINES: usize = 2;

const START_TIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// One granule row of the manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct GranuleRecord {
    pub granule_id: String,
    pub start_time: NaiveDateTime,
    pub day_night: DayNightFlag,
    /// Footprint corners as (lon, lat), in manifest order.
    pub footprint: [(f64, f64); 4],
}

/// Column positions resolved from the header row.
#[derive(Debug, Clone)]
struct Columns {
    granule_id: usize,
    start_time: usize,
    day_night: usize,
    lon: [usize; 4],
    lat: [usize; 4],
}

impl Columns {
    fn from_header(header: &StringRecord) -> std::result::Result<Self, String> {
        let mut lon = [0usize; 4];
        let mut lat = [0usize; 4];
        for i in 0..4 {
            let lon_name = format!("GRingLongitude{}", i + 1);
            let lat_name = format!("GRingLatitude{}", i + 1);
            lon[i] = find_column(header, &[lon_name.as_str()])?;
            lat[i] = find_column(header, &[lat_name.as_str()])?;
        }
        Ok(Columns {
            granule_id: find_column(header, &["# GranuleID", "#GranuleID", "GranuleID"])?,
            start_time: find_column(header, &["StartDateTime"])?,
            day_night: find_column(header, &["DayNightFlag"])?,
            lon,
            lat,
        })
    }

    fn parse_row(&self, row: &StringRecord) -> std::result::Result<GranuleRecord, String> {
        let granule_id = field(row, self.granule_id, "GranuleID")?.to_string();
        let raw_time = field(row, self.start_time, "StartDateTime")?;
        let start_time = parse_start_time(raw_time)
            .ok_or_else(|| format!("invalid StartDateTime `{}`", raw_time))?;
        let raw_flag = field(row, self.day_night, "DayNightFlag")?;
        let day_night = DayNightFlag::from_code(raw_flag)
            .ok_or_else(|| format!("unknown DayNightFlag `{}`", raw_flag))?;

        let mut footprint = [(0.0, 0.0); 4];
        for i in 0..4 {
            footprint[i] = (
                coord(row, self.lon[i], "GRingLongitude")?,
                coord(row, self.lat[i], "GRingLatitude")?,
            );
        }

        Ok(GranuleRecord {
            granule_id,
            start_time,
            day_night,
            footprint,
        })
    }
}

fn find_column(header: &StringRecord, names: &[&str]) -> std::result::Result<usize, String> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        .ok_or_else(|| format!("manifest header lacks column `{}`", names[0]))
}

fn field<'a>(row: &'a StringRecord, idx: usize, name: &str) -> std::result::Result<&'a str, String> {
    match row.get(idx) {
        Some(v) if !v.trim().is_empty() => Ok(v.trim()),
        _ => Err(format!("missing {}", name)),
    }
}

fn coord(row: &StringRecord, idx: usize, name: &str) -> std::result::Result<f64, String> {
    let raw = field(row, idx, name)?;
    raw.parse::<f64>()
        .map_err(|_| format!("invalid {} `{}`", name, raw))
}

/// Parse a manifest `StartDateTime` value.
pub fn parse_start_time(raw: &str) -> Option<NaiveDateTime> {
    START_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
}

/// Handle on a manifest file. Every call to [`Manifest::records`] re-reads the
/// file from the start, so iteration is restartable.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Open the manifest and return a lazy iterator over its valid rows.
    pub fn records(&self) -> Result<ManifestRecords> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let mut skipped = String::new();
        for _ in 0..PREAMBLE_LINES {
            skipped.clear();
            if reader.read_line(&mut skipped)? == 0 {
                break;
            }
        }

        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        let header = csv_reader.headers()?.clone();
        let columns = Columns::from_header(&header).map_err(|reason| {
            csv::Error::from(std::io::Error::new(std::io::ErrorKind::InvalidData, reason))
        })?;
        debug!("Manifest {:?} columns resolved: {:?}", self.path, columns);

        Ok(ManifestRecords {
            rows: csv_reader.into_records(),
            columns,
            line: PREAMBLE_LINES + 1,
        })
    }

    /// Convenience: collect every valid row.
    pub fn load(&self) -> Result<Vec<GranuleRecord>> {
        Ok(self.records()?.collect())
    }
}

/// Lazy sequence of [`GranuleRecord`]s; unreadable rows are logged and skipped.
pub struct ManifestRecords {
    rows: StringRecordsIntoIter<BufReader<File>>,
    columns: Columns,
    line: usize,
}

impl Iterator for ManifestRecords {
    type Item = GranuleRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            self.line += 1;
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable manifest row {}: {}", self.line, e);
                    continue;
                }
            };
            if row.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            match self.columns.parse_row(&row) {
                Ok(record) => return Some(record),
                Err(reason) => {
                    warn!("Skipping manifest row {}: {}", self.line, reason);
                }
            }
        }
    }
}
