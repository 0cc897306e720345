mod common;

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use gdal::raster::{Buffer, ColorInterpretation};
use gdal::spatial_ref::SpatialRef;
use gdal::{Dataset, DriverManager};

use common::*;
use modisnrt::core::processing::merge::{georeference, merge_rgb};
use modisnrt::io::RasterReader;
use modisnrt::{
    Collaborators, FetchStatus, Pipeline, PipelineState, Result, ToolInvocation, ToolInvoker,
};

const NODATA: i16 = -28672;
const GEOTRANSFORM: [f64; 6] = [-75.0, 0.5, 0.0, 46.0, 0.0, -0.5];

fn wgs84() -> String {
    SpatialRef::from_epsg(4326).unwrap().to_wkt().unwrap()
}

/// 2x2 Int16 GeoTIFF in the layout the swath tool produces.
fn write_band(path: &Path, values: [i16; 4]) {
    let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
    let mut ds = driver
        .create_with_band_type::<i16, _>(path, 2, 2, 1)
        .unwrap();
    ds.set_geo_transform(&GEOTRANSFORM).unwrap();
    ds.set_projection(&wgs84()).unwrap();
    let mut band = ds.rasterband(1).unwrap();
    band.set_no_data_value(Some(NODATA as f64)).unwrap();
    let mut buf = Buffer::new((2, 2), values.to_vec());
    band.write((0, 0), (2, 2), &mut buf).unwrap();
}

fn write_bands(paths: &[PathBuf]) {
    write_band(&paths[0], [0, 1000, 400, NODATA]);
    write_band(&paths[1], [250, 750, 1000, 0]);
    write_band(&paths[2], [NODATA, 0, 0, 600]);
}

fn band_values(reader: &RasterReader, index: usize) -> Vec<f64> {
    reader.read_band(index).unwrap().iter().copied().collect()
}

#[test]
fn merges_three_bands_into_scaled_rgb() {
    let dir = tempfile::tempdir().unwrap();
    let bands: Vec<PathBuf> = ["b1.tif", "b4.tif", "b3.tif"]
        .iter()
        .map(|n| dir.path().join(n))
        .collect();
    write_bands(&bands);

    let merged = dir.path().join("final").join("2024-03-28_2035_aqua.tif");
    merge_rgb(&bands, &merged).unwrap();

    let reader = RasterReader::open(&merged).unwrap();
    assert_eq!(reader.metadata.bands, 3);
    assert_eq!((reader.metadata.size_x, reader.metadata.size_y), (2, 2));
    assert_eq!(reader.metadata.geotransform, Some(GEOTRANSFORM));
    assert_eq!(band_values(&reader, 1), vec![0.0, 255.0, 102.0, 0.0]);
    assert_eq!(band_values(&reader, 2), vec![64.0, 191.0, 255.0, 0.0]);
    assert_eq!(band_values(&reader, 3), vec![0.0, 0.0, 0.0, 153.0]);

    let roles: Vec<ColorInterpretation> = (1..=3)
        .map(|i| reader.dataset.rasterband(i).unwrap().color_interpretation())
        .collect();
    assert_eq!(
        roles,
        vec![
            ColorInterpretation::RedBand,
            ColorInterpretation::GreenBand,
            ColorInterpretation::BlueBand
        ]
    );
}

#[test]
fn merge_rejects_wrong_band_count() {
    let dir = tempfile::tempdir().unwrap();
    let band = dir.path().join("b1.tif");
    write_band(&band, [1, 2, 3, 4]);
    let err = merge_rgb(&[band.clone(), band], &dir.path().join("out.tif")).unwrap_err();
    assert!(matches!(err, modisnrt::Error::Processing(_)));
}

#[test]
fn georeference_copies_source_transform() {
    let dir = tempfile::tempdir().unwrap();
    let bands: Vec<PathBuf> = ["b1.tif", "b4.tif", "b3.tif"]
        .iter()
        .map(|n| dir.path().join(n))
        .collect();
    write_bands(&bands);
    let merged = dir.path().join("aqua.tif");
    merge_rgb(&bands, &merged).unwrap();

    // strip the georeference so the copy has to restore it
    let mut ds = Dataset::open_ex(
        &merged,
        gdal::DatasetOptions {
            open_flags: gdal::GdalOpenFlags::GDAL_OF_UPDATE | gdal::GdalOpenFlags::GDAL_OF_RASTER,
            ..Default::default()
        },
    )
    .unwrap();
    ds.set_geo_transform(&[0.0, 1.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
    drop(ds);

    let georef = dir.path().join("aqua_georef.tif");
    georeference(&merged, &georef, &bands[0]).unwrap();
    let reader = RasterReader::open(&georef).unwrap();
    assert_eq!(reader.metadata.geotransform, Some(GEOTRANSFORM));
    assert!(reader.metadata.projection.contains("WGS"));
    assert_eq!(band_values(&reader, 1), vec![0.0, 255.0, 102.0, 0.0]);
}

/// Plays the swath tool and `gdal_translate` by dropping their outputs on disk.
struct FakeToolchain {
    band_rasters: Vec<PathBuf>,
    invocations: RefCell<Vec<String>>,
}

impl ToolInvoker for FakeToolchain {
    fn invoke(&self, invocation: &ToolInvocation) -> Result<Option<i32>> {
        let tool = invocation.tool_name();
        if tool == "swtif" {
            write_bands(&self.band_rasters);
        } else {
            let kml = PathBuf::from(&invocation.args[3]);
            let staging = kml.parent().unwrap();
            fs::write(&kml, "<kml/>")?;
            fs::create_dir_all(staging.join("0"))?;
            fs::write(staging.join("0").join("0.png"), [0u8; 4])?;
        }
        self.invocations.borrow_mut().push(tool);
        Ok(Some(0))
    }
}

#[test]
fn full_run_produces_kmz_and_cleans_up() {
    let ws = Workspace::new();
    let config = ws.config();
    let stamp = "2024-03-28_2035";
    let band_rasters: Vec<PathBuf> = config
        .names
        .base_filenames
        .iter()
        .map(|b| ws.path("bands").join(format!("{}_MODIS_SWATH_TYPE_L2_{}", stamp, b)))
        .collect();

    let metadata = FakeMetadata::serving(manifest_text());
    let downloader = FakeDownloader::new(FetchStatus::Ok);
    let tools = FakeToolchain {
        band_rasters: band_rasters.clone(),
        invocations: RefCell::new(Vec::new()),
    };
    let collaborators = Collaborators {
        metadata: &metadata,
        downloader: &downloader,
        tools: &tools,
    };

    let mut pipeline = Pipeline::new(&config, collaborators).unwrap();
    let products = pipeline.run().unwrap();
    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(
        tools.invocations.borrow().as_slice(),
        ["swtif", "gdal_translate"]
    );

    assert_eq!(products.kmz, ws.path("kmz").join("2024-03-28_2035_aqua.kmz"));
    assert!(products.kmz.is_file());
    assert!(ws.path("final").join("2024-03-28_2035_aqua.tif").is_file());
    assert!(products.georeferenced.is_file());
    for band in &band_rasters {
        assert!(!band.exists());
    }
    assert!(!ws.path("kmz").join("tmp").exists());
}
