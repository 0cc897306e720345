//! Shared types and enums used across the pipeline.
//! Includes `DayNightFlag`, `SelectionPolicy`, `BoundingBox`, the pipeline
//! state machine (`PipelineState`, `PipelineStage`) and `FetchStatus`.
use chrono::NaiveDateTime;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DayNightFlag {
    Day,
    Night,
}

impl DayNightFlag {
    /// Parse the single-letter manifest code (`D` / `N`).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "D" | "d" => Some(DayNightFlag::Day),
            "N" | "n" => Some(DayNightFlag::Night),
            _ => None,
        }
    }
}

impl std::fmt::Display for DayNightFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DayNightFlag::Day => write!(f, "Day"),
            DayNightFlag::Night => write!(f, "Night"),
        }
    }
}

/// Which intersecting granule wins when several cover the area of interest.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SelectionPolicy {
    /// Last record in manifest order.
    Latest,
    /// Record whose start time is nearest to the given instant.
    ClosestTo(NaiveDateTime),
}

impl std::fmt::Display for SelectionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionPolicy::Latest => write!(f, "Latest"),
            SelectionPolicy::ClosestTo(t) => write!(f, "ClosestTo({})", t.format("%Y-%m-%d %H:%M")),
        }
    }
}

/// Spatial subset corners in the swath tool's `( lat lon )` notation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BoundingBox {
    pub upper_left: String,
    pub lower_right: String,
}

impl BoundingBox {
    pub fn from_bounds(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            upper_left: format!("( {} {} )", max_lat, min_lon),
            lower_right: format!("( {} {} )", min_lat, max_lon),
        }
    }
}

/// Stages of a pipeline run, named after the transition that enters them.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PipelineStage {
    FetchMetadata,
    SelectGranule,
    AcquireHdf,
    PrepareParameters,
    Convert,
    Merge,
    Georeference,
    Package,
    Cleanup,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PipelineStage::FetchMetadata => "metadata fetch",
            PipelineStage::SelectGranule => "granule selection",
            PipelineStage::AcquireHdf => "HDF acquisition",
            PipelineStage::PrepareParameters => "parameter preparation",
            PipelineStage::Convert => "swath conversion",
            PipelineStage::Merge => "band merge",
            PipelineStage::Georeference => "georeference",
            PipelineStage::Package => "KMZ packaging",
            PipelineStage::Cleanup => "cleanup",
        };
        write!(f, "{}", s)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PipelineState {
    Idle,
    MetadataFetched,
    GranuleSelected,
    HdfAcquired,
    ParameterPrepared,
    Converted,
    Merged,
    Georeferenced,
    Packaged,
    Done,
    Failed(PipelineStage),
}

impl PipelineState {
    /// The stage that leaves this state, `None` for terminal states.
    pub fn next_stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineState::Idle => Some(PipelineStage::FetchMetadata),
            PipelineState::MetadataFetched => Some(PipelineStage::SelectGranule),
            PipelineState::GranuleSelected => Some(PipelineStage::AcquireHdf),
            PipelineState::HdfAcquired => Some(PipelineStage::PrepareParameters),
            PipelineState::ParameterPrepared => Some(PipelineStage::Convert),
            PipelineState::Converted => Some(PipelineStage::Merge),
            PipelineState::Merged => Some(PipelineStage::Georeference),
            PipelineState::Georeferenced => Some(PipelineStage::Package),
            PipelineState::Packaged => Some(PipelineStage::Cleanup),
            PipelineState::Done | PipelineState::Failed(_) => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next_stage().is_none()
    }
}

/// Outcome reported by the external fetch utility.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum FetchStatus {
    Ok,
    NotFound,
    Failed(Option<i32>),
}

impl FetchStatus {
    /// Map a fetch utility exit code (0 ok, 8 server said not found).
    pub fn from_exit_code(code: Option<i32>) -> Self {
        match code {
            Some(0) => FetchStatus::Ok,
            Some(8) => FetchStatus::NotFound,
            other => FetchStatus::Failed(other),
        }
    }
}
