//! Area-of-interest loader. The AOI is the first feature of a KML document and
//! must be a polygon in EPSG:4326; any further features are ignored.
use std::fs;
use std::path::Path;

use geo::BoundingRect;
use geo_types::{Geometry, Polygon};
use kml::Kml;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::BoundingBox;

/// A single closed polygon in geographic (lon, lat) coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaOfInterest {
    polygon: Polygon<f64>,
}

impl AreaOfInterest {
    pub fn new(polygon: Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// Load the first feature of a KML file.
    pub fn from_kml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| Error::GeometryLoad {
            path: path.to_path_buf(),
            reason,
        };

        let text = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let aoi = Self::from_kml_str(&text).map_err(load_error)?;
        info!("Loaded area of interest from {:?}", path);
        Ok(aoi)
    }

    /// Parse KML text; the error is a human-readable reason.
    pub fn from_kml_str(text: &str) -> std::result::Result<Self, String> {
        let document: Kml<f64> = text.parse().map_err(|e: kml::Error| e.to_string())?;
        let collection = kml::quick_collection(document).map_err(|e| e.to_string())?;
        let total = collection.0.len();
        match collection.0.into_iter().next() {
            None => Err("document contains no features".to_string()),
            Some(Geometry::Polygon(polygon)) => {
                if total > 1 {
                    debug!("AOI document has {} features; using the first", total);
                }
                Ok(Self::new(polygon))
            }
            Some(other) => Err(format!(
                "first feature is not a polygon ({})",
                geometry_kind(&other)
            )),
        }
    }

    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Minimum enclosing rectangle as (min_lon, min_lat, max_lon, max_lat).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.polygon
            .bounding_rect()
            .map(|r| (r.min().x, r.min().y, r.max().x, r.max().y))
    }

    /// Subset corners for the swath tool parameter file.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds()
            .map(|(min_lon, min_lat, max_lon, max_lat)| {
                BoundingBox::from_bounds(min_lon, min_lat, max_lon, max_lat)
            })
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        _ => "other geometry",
    }
}
