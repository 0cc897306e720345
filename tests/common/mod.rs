#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};

use modisnrt::{
    Config, FetchStatus, GranuleDownloader, MetadataFetcher, Result, ToolInvocation, ToolInvoker,
};

pub const HEADER: &str = "# GranuleID,StartDateTime,ArchiveSet,OrbitNumber,DayNightFlag,EastBoundingCoord,NorthBoundingCoord,SouthBoundingCoord,WestBoundingCoord,GRingLongitude1,GRingLongitude2,GRingLongitude3,GRingLongitude4,GRingLatitude1,GRingLatitude2,GRingLatitude3,GRingLatitude4";

pub const TARGET_ID: &str = "MYD03.A2024088.2035.061.2024088213921.NRT.hdf";
pub const COMPANION_FILE: &str = "MYD09.A2024088.2035.061.NRT.hdf";

/// Three day granules, only the middle one over the AOI.
pub fn manifest_text() -> String {
    let rows = [
        "MYD03.A2024088.1720.061.2024088184011.NRT.hdf,2024-03-28 17:20,61,114948,D,20,20,10,10,10,20,20,10,20,20,10,10",
        "MYD03.A2024088.2035.061.2024088213921.NRT.hdf,2024-03-28 20:35,61,114950,D,-74,46,45,-75,-75,-74,-74,-75,46,46,45,45",
        "MYD03.A2024088.2215.061.2024088233000.NRT.hdf,2024-03-28 22:15,61,114951,D,110,0,-10,100,100,110,110,100,0,0,-10,-10",
    ];
    format!(
        "# LANCE MODIS Aqua geolocation\n# near real time\n{}\n{}\n",
        HEADER,
        rows.join("\n")
    )
}

pub fn manifest_without_cover() -> String {
    format!(
        "# LANCE\n# NRT\n{}\nMYD03.A2024088.1720.061.2024088184011.NRT.hdf,2024-03-28 17:20,61,114948,D,20,20,10,10,10,20,20,10,20,20,10,10\n",
        HEADER
    )
}

pub const AOI_KML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2"><Document><Placemark><name>aoi</name>
<Polygon><outerBoundaryIs><LinearRing><coordinates>-75,45,0 -74,45,0 -74,46,0 -75,46,0 -75,45,0</coordinates></LinearRing></outerBoundaryIs></Polygon>
</Placemark></Document></kml>"#;

pub const TEMPLATE: &str = "\r\nNUM_RUNS = 1\r\n\r\nBEGIN\r\nINPUT_FILENAME = placeholder.hdf\r\nOBJECT_NAME = MODIS_SWATH_Type_L2|\r\nFIELD_NAME = 500m Surface Reflectance Band 1|\r\nSPATIAL_SUBSET_UL_CORNER = ( 0 0 )\r\nSPATIAL_SUBSET_LR_CORNER = ( 0 0 )\r\nOUTPUT_FILENAME = one.tif\r\nOUTPUT_FILENAME = two.tif\r\nOUTPUT_FILENAME = three.tif\r\nEND\r\n";

/// Scratch workspace with a config pointing into it.
pub struct Workspace {
    pub dir: tempfile::TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        fs::write(ws.path("aoi.kml"), AOI_KML).unwrap();
        fs::write(ws.path("Template_swath.prm"), TEMPLATE).unwrap();
        ws
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn config(&self) -> Config {
        self.config_with(|rel| self.path(rel).display().to_string())
    }

    /// Config whose paths are rendered by `p` from workspace-relative names.
    pub fn config_with(&self, p: impl Fn(&str) -> String) -> Config {
        let text = format!(
            r#"
[paths]
parameter_file = '{}'
geotiff_folder = '{}'
tiff_final = '{}'
kmz_folder = '{}'
gdal_translate = 'gdal_translate'

[names]
base_filenames = ["band1.tif", "band4.tif", "band3.tif"]

[hegtool]
directory = '{}'
mrtbindir = '/opt/heg/bin'
pgshome = '/opt/heg/TOOLKIT_MTD'
mrtdatadir = '/opt/heg/data'

[lance]
auth_token = 'token'
download_hdf_folder = '{}'
metadata_file = '{}'
base_txt_url = 'https://lance.test/MYD03/'
base_hdf_url = 'https://lance.test/MYD09/Recent'
test_time = '2024-03-28 20:30'

[bounding_box]
kml_aoi_file = '{}'
"#,
            p("Template_swath.prm"),
            p("bands"),
            p("final"),
            p("kmz"),
            p("heg"),
            p("hdf"),
            p("meta/MYD03_today.txt"),
            p("aoi.kml"),
        );
        Config::from_toml_str(&text).unwrap()
    }
}

/// Writes canned manifest text to the requested destination.
pub struct FakeMetadata {
    pub body: String,
    pub status: FetchStatus,
    pub urls: RefCell<Vec<String>>,
}

impl FakeMetadata {
    pub fn serving(body: String) -> Self {
        Self {
            body,
            status: FetchStatus::Ok,
            urls: RefCell::new(Vec::new()),
        }
    }
}

impl MetadataFetcher for FakeMetadata {
    fn fetch_manifest(&self, url: &str, destination: &Path) -> Result<FetchStatus> {
        self.urls.borrow_mut().push(url.to_string());
        if self.status == FetchStatus::Ok {
            fs::write(destination, &self.body)?;
        }
        Ok(self.status)
    }
}

/// Counts downloads; on success drops an empty file named after the URL tail.
pub struct FakeDownloader {
    pub status: FetchStatus,
    pub calls: Cell<usize>,
    pub urls: RefCell<Vec<String>>,
}

impl FakeDownloader {
    pub fn new(status: FetchStatus) -> Self {
        Self {
            status,
            calls: Cell::new(0),
            urls: RefCell::new(Vec::new()),
        }
    }
}

impl GranuleDownloader for FakeDownloader {
    fn download_granule(&self, url: &str, directory: &Path) -> Result<FetchStatus> {
        self.calls.set(self.calls.get() + 1);
        self.urls.borrow_mut().push(url.to_string());
        if self.status == FetchStatus::Ok {
            let name = url.rsplit('/').next().unwrap_or("granule.hdf");
            fs::write(directory.join(name), b"HDF")?;
        }
        Ok(self.status)
    }
}

/// Records invocations and answers with a fixed exit code.
pub struct RecordingTools {
    pub exit_code: Option<i32>,
    pub invocations: RefCell<Vec<ToolInvocation>>,
}

impl RecordingTools {
    pub fn exiting(exit_code: Option<i32>) -> Self {
        Self {
            exit_code,
            invocations: RefCell::new(Vec::new()),
        }
    }
}

impl ToolInvoker for RecordingTools {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<Option<i32>> {
        self.invocations.borrow_mut().push(invocation.clone());
        Ok(self.exit_code)
    }
}
