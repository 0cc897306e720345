#![doc = r#"
MODISNRT — near-real-time MODIS true-colour overlays for a fixed area of interest.

Each run downloads the day's LANCE geolocation manifest, picks the daytime
Aqua granule that covers the area of interest, fetches the matching surface
reflectance swath, re-extracts three bands with the HEG swath converter,
stretches them into an RGB GeoTIFF and packages a KML superoverlay as KMZ.
It powers the `modisnrt` CLI and can be driven from your own code.

Requirements
------------
- GDAL development headers and runtime, plus `gdal_translate` on the path.
- The HEG toolkit (`swtif`) and its data directories.
- `wget` and a LANCE bearer token.

Running a configured pipeline
-----------------------------
```rust,no_run
use modisnrt::{Collaborators, Config, Pipeline, ProcessInvoker, WgetFetcher};

fn main() -> modisnrt::Result<()> {
    let config = Config::load("~/modis/modisnrt.toml")?;
    let wget = WgetFetcher::new(&config.lance.wget, &config.lance.auth_token);
    let collaborators = Collaborators {
        metadata: &wget,
        downloader: &wget,
        tools: &ProcessInvoker,
    };
    let products = Pipeline::new(&config, collaborators)?.run()?;
    println!("overlay written to {:?}", products.kmz);
    Ok(())
}
```

Selecting a granule without the pipeline
----------------------------------------
```rust,no_run
use modisnrt::{AreaOfInterest, Manifest, SelectionPolicy, select};

fn main() -> modisnrt::Result<()> {
    let aoi = AreaOfInterest::from_kml("aoi.kml")?;
    let records = Manifest::new("MYD03_2024-03-28.txt").records()?;
    let selection = select(records, &aoi, SelectionPolicy::Latest)?;
    println!(
        "{} UL={} LR={}",
        selection.granule.granule_id, selection.bbox.upper_left, selection.bbox.lower_right
    );
    Ok(())
}
```

Error handling
--------------
All public functions return `modisnrt::Result<T>`. Every `modisnrt::Error`
is fatal to a run; `Error::FetchNotFound` means the image is not published
yet and the run can simply be repeated later.

Useful modules
--------------
- [`core`] — configuration, selection, id surgery, the run pipeline.
- [`io`] — manifest/AOI readers, parameter file, fetch and tool invocation, writers.
- [`types`] — shared enums (`DayNightFlag`, `SelectionPolicy`, `PipelineState`).
- [`error`] — crate-level `Error` and `Result`.
"#]

pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
pub use core::config::Config;
pub use core::granule_id::{acquisition_stamp, companion_granule_id};
pub use core::naming::RunProducts;
pub use core::processing::pipeline::{Collaborators, Pipeline, PipelineRun};
pub use core::selector::{Selection, select};
pub use error::{Error, Result};
pub use types::{BoundingBox, DayNightFlag, FetchStatus, PipelineStage, PipelineState, SelectionPolicy};

pub use io::aoi::AreaOfInterest;
pub use io::fetch::{GranuleDownloader, MetadataFetcher, WgetFetcher};
pub use io::manifest::{GranuleRecord, Manifest};
pub use io::parameter_file::{ParameterValues, convert_windows_to_unix_line_endings, rewrite};
pub use io::tools::{ProcessInvoker, ToolInvocation, ToolInvoker};
