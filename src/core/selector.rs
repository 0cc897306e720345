//! Granule selection: intersect footprints with the area of interest, keep
//! daytime acquisitions only, then apply the [`SelectionPolicy`].
//!
//! Footprints are treated as planar polygons in lon/lat. Rings that straddle
//! the antimeridian cannot be represented that way and are excluded instead
//! of being split.
use geo::{Area, Intersects, Validation};
use geo_types::{LineString, Polygon};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::io::aoi::AreaOfInterest;
use crate::io::manifest::GranuleRecord;
use crate::types::{BoundingBox, DayNightFlag, SelectionPolicy};

/// Longitude extent above which a footprint is assumed to wrap around ±180°.
const MAX_LONGITUDE_SPAN: f64 = 180.0;

/// The granule chosen for a run and the AOI subset corners.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub granule: GranuleRecord,
    /// Position of the granule in the manifest.
    pub index: usize,
    pub bbox: BoundingBox,
}

impl GranuleRecord {
    /// Footprint ring as a polygon, `None` when it is degenerate or crosses
    /// the antimeridian.
    pub fn footprint_polygon(&self) -> Option<Polygon<f64>> {
        if self
            .footprint
            .iter()
            .any(|(lon, lat)| !lon.is_finite() || !lat.is_finite())
        {
            return None;
        }
        let (min_lon, max_lon) = self
            .footprint
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (lon, _)| {
                (lo.min(*lon), hi.max(*lon))
            });
        if max_lon - min_lon > MAX_LONGITUDE_SPAN {
            return None;
        }

        let polygon = Polygon::new(LineString::from(self.footprint.to_vec()), vec![]);
        if polygon.unsigned_area() <= 0.0 || !polygon.is_valid() {
            return None;
        }
        Some(polygon)
    }
}

/// Pick one granule from `records` for the area of interest.
///
/// Night granules never qualify. An empty candidate set is an error rather
/// than a fallback to some arbitrary row.
pub fn select<I>(records: I, aoi: &AreaOfInterest, policy: SelectionPolicy) -> Result<Selection>
where
    I: IntoIterator<Item = GranuleRecord>,
{
    let bbox = aoi.bounding_box().ok_or_else(|| Error::GeometryLoad {
        path: Default::default(),
        reason: "area of interest has no extent".to_string(),
    })?;

    let mut candidates: Vec<(usize, GranuleRecord)> = Vec::new();
    for (index, record) in records.into_iter().enumerate() {
        let Some(footprint) = record.footprint_polygon() else {
            debug!("Excluding {}: unusable footprint", record.granule_id);
            continue;
        };
        if !footprint.intersects(aoi.polygon()) {
            continue;
        }
        if record.day_night != DayNightFlag::Day {
            debug!("Excluding {}: night acquisition", record.granule_id);
            continue;
        }
        debug!(
            "Candidate {} at {} (row {}), footprint {:?}",
            record.granule_id, record.start_time, index, record.footprint
        );
        candidates.push((index, record));
    }
    info!(
        "{} day granule(s) intersect the area of interest",
        candidates.len()
    );

    let chosen = match policy {
        SelectionPolicy::Latest => candidates.pop(),
        SelectionPolicy::ClosestTo(target) => {
            let mut best: Option<(i64, usize)> = None;
            for (pos, (_, record)) in candidates.iter().enumerate() {
                let delta = (record.start_time - target).num_seconds().abs();
                // strict comparison keeps the earliest row on ties
                if best.is_none_or(|(best_delta, _)| delta < best_delta) {
                    best = Some((delta, pos));
                }
            }
            best.map(|(_, pos)| candidates.swap_remove(pos))
        }
    };

    let (index, granule) = chosen.ok_or(Error::NoGranuleFound)?;
    info!(
        "Selected granule {} (manifest row {}, policy {})",
        granule.granule_id, index, policy
    );
    Ok(Selection {
        granule,
        index,
        bbox,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 28)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn square(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> [(f64, f64); 4] {
        [
            (min_lon, max_lat),
            (max_lon, max_lat),
            (max_lon, min_lat),
            (min_lon, min_lat),
        ]
    }

    fn record(id: &str, time: NaiveDateTime, flag: DayNightFlag, fp: [(f64, f64); 4]) -> GranuleRecord {
        GranuleRecord {
            granule_id: id.to_string(),
            start_time: time,
            day_night: flag,
            footprint: fp,
        }
    }

    fn aoi() -> AreaOfInterest {
        AreaOfInterest::new(Polygon::new(
            LineString::from(vec![(-75.0, 45.0), (-74.0, 45.0), (-74.0, 46.0), (-75.0, 46.0)]),
            vec![],
        ))
    }

    const COVER: [(f64, f64); 4] = [(-80.0, 50.0), (-70.0, 50.0), (-70.0, 40.0), (-80.0, 40.0)];

    #[test]
    fn night_records_never_selected() {
        let records = vec![
            record("day", at(15, 0), DayNightFlag::Day, COVER),
            record("night", at(3, 0), DayNightFlag::Night, COVER),
        ];
        let sel = select(records.clone(), &aoi(), SelectionPolicy::Latest).unwrap();
        assert_eq!(sel.granule.granule_id, "day");
        let sel = select(records, &aoi(), SelectionPolicy::ClosestTo(at(3, 0))).unwrap();
        assert_eq!(sel.granule.granule_id, "day");
    }

    #[test]
    fn only_night_coverage_is_an_error() {
        let records = vec![record("night", at(3, 0), DayNightFlag::Night, COVER)];
        let err = select(records, &aoi(), SelectionPolicy::Latest).unwrap_err();
        assert!(matches!(err, Error::NoGranuleFound));
    }

    #[test]
    fn no_intersection_is_an_error() {
        let records = vec![
            record("a", at(15, 0), DayNightFlag::Day, square(10.0, 10.0, 20.0, 20.0)),
            record("b", at(16, 0), DayNightFlag::Day, square(-60.0, 10.0, -50.0, 20.0)),
        ];
        let err = select(records, &aoi(), SelectionPolicy::Latest).unwrap_err();
        assert!(matches!(err, Error::NoGranuleFound));
    }

    #[test]
    fn latest_takes_last_in_manifest_order() {
        let records = vec![
            record("first", at(15, 0), DayNightFlag::Day, COVER),
            record("elsewhere", at(15, 30), DayNightFlag::Day, square(10.0, 10.0, 20.0, 20.0)),
            record("second", at(16, 0), DayNightFlag::Day, COVER),
            record("later-night", at(17, 0), DayNightFlag::Night, COVER),
        ];
        let sel = select(records, &aoi(), SelectionPolicy::Latest).unwrap();
        assert_eq!(sel.granule.granule_id, "second");
        assert_eq!(sel.index, 2);
    }

    #[test]
    fn closest_to_prefers_smaller_delta() {
        let target = at(12, 0);
        let records = vec![
            record("five-after", at(12, 5), DayNightFlag::Day, COVER),
            record("three-before", at(11, 57), DayNightFlag::Day, COVER),
        ];
        let sel = select(records, &aoi(), SelectionPolicy::ClosestTo(target)).unwrap();
        assert_eq!(sel.granule.granule_id, "three-before");
    }

    #[test]
    fn closest_to_tie_keeps_lowest_index() {
        let target = at(12, 0);
        let records = vec![
            record("after", at(12, 3), DayNightFlag::Day, COVER),
            record("before", at(11, 57), DayNightFlag::Day, COVER),
        ];
        let sel = select(records, &aoi(), SelectionPolicy::ClosestTo(target)).unwrap();
        assert_eq!(sel.granule.granule_id, "after");
        assert_eq!(sel.index, 0);
    }

    #[test]
    fn antimeridian_footprints_are_excluded() {
        let wrapped = [(179.0, 50.0), (-179.0, 50.0), (-179.0, 40.0), (179.0, 40.0)];
        let rec = record("wrap", at(12, 0), DayNightFlag::Day, wrapped);
        assert!(rec.footprint_polygon().is_none());
    }

    #[test]
    fn degenerate_footprints_are_excluded() {
        let flat = [(-75.0, 45.0), (-74.0, 45.0), (-73.0, 45.0), (-72.0, 45.0)];
        let rec = record("flat", at(12, 0), DayNightFlag::Day, flat);
        assert!(rec.footprint_polygon().is_none());
        let err = select(vec![rec], &aoi(), SelectionPolicy::Latest).unwrap_err();
        assert!(matches!(err, Error::NoGranuleFound));
    }

    #[test]
    fn end_to_end_corners() {
        let records = vec![
            record("MYD03.A2024088.1720.061.2024088184011.NRT.hdf", at(17, 20), DayNightFlag::Day, square(10.0, 10.0, 20.0, 20.0)),
            record("MYD03.A2024088.2035.061.2024088213921.NRT.hdf", at(20, 35), DayNightFlag::Day, square(-75.0, 45.0, -74.0, 46.0)),
            record("MYD03.A2024088.2215.061.2024088233000.NRT.hdf", at(22, 15), DayNightFlag::Day, square(100.0, -10.0, 110.0, 0.0)),
        ];
        let sel = select(records, &aoi(), SelectionPolicy::Latest).unwrap();
        assert_eq!(sel.granule.granule_id, "MYD03.A2024088.2035.061.2024088213921.NRT.hdf");
        assert_eq!(sel.bbox.upper_left, "( 46 -75 )");
        assert_eq!(sel.bbox.lower_right, "( 45 -74 )");
    }
}
