//! Granule identifier surgery.
//!
//! LANCE identifiers have a fixed layout, e.g.
//! `MYD03.A2024088.2035.061.2024088213921.NRT.hdf`:
//! product prefix (`MYD0`), sensor/product digit (`3`), then `.AYYYYDDD.HHMM`.
//! The reflectance product shares everything up to the acquisition time, so
//! its id is built by splicing at fixed offsets rather than by parsing.
use chrono::NaiveDateTime;

use crate::error::{Error, Result};

/// Product digit of the surface reflectance (MYD09) companion.
pub const COMPANION_PRODUCT_DIGIT: char = '9';
/// Collection, processing tier and container suffix appended to the companion id.
pub const COMPANION_SUFFIX: &str = ".061.NRT.hdf";

const PREFIX_LEN: usize = 4;
/// Characters kept from the source id: prefix, digit, `.AYYYYDDD.HHMM`.
pub const GRANULE_ID_MIN_LEN: usize = 19;
/// Byte range holding `YYYYDDD.HHMM`.
const ACQUISITION_RANGE: std::ops::Range<usize> = 7..19;

fn check_width(id: &str) -> Result<()> {
    if id.len() < GRANULE_ID_MIN_LEN || !id.is_ascii() {
        return Err(Error::MalformedGranuleId {
            id: id.to_string(),
            expected: GRANULE_ID_MIN_LEN,
        });
    }
    Ok(())
}

/// Derive the companion reflectance product filename from a geolocation id.
pub fn companion_granule_id(id: &str) -> Result<String> {
    check_width(id)?;
    let mut out = String::with_capacity(GRANULE_ID_MIN_LEN + COMPANION_SUFFIX.len());
    out.push_str(&id[..PREFIX_LEN]);
    out.push(COMPANION_PRODUCT_DIGIT);
    out.push_str(&id[PREFIX_LEN + 1..GRANULE_ID_MIN_LEN]);
    out.push_str(COMPANION_SUFFIX);
    Ok(out)
}

/// Acquisition start encoded in the id (`YYYYDDD.HHMM`, day-of-year form).
pub fn acquisition_time(id: &str) -> Result<NaiveDateTime> {
    check_width(id)?;
    let raw = &id[ACQUISITION_RANGE];
    NaiveDateTime::parse_from_str(raw, "%Y%j.%H%M").map_err(|_| Error::MalformedGranuleId {
        id: id.to_string(),
        expected: GRANULE_ID_MIN_LEN,
    })
}

/// Stamp used to name every product of a run, e.g. `2024-03-28_2035`.
pub fn acquisition_stamp(id: &str) -> Result<String> {
    Ok(acquisition_time(id)?.format("%Y-%m-%d_%H%M").to_string())
}
