//! End-to-end tests: GeoTIFF fixture in, PNG out.

use image::Rgba;
use lowland_dem::DemError;
use lowland_plot::{
    zoom_to_location, BBox, FigureOptions, Interpolation, PlotError, SaveOptions, ZoomOptions,
};
use lowland_test_utils::{sd_data_tif, temp_test_dir, GeoTiffFixture};
use std::path::{Path, PathBuf};

/// 12 x 10 raster at (-118, 34) with 0.1 degree pixels.
///
/// Columns 0-5 hold `col - 5` (all below 1 m), columns 6-11 hold `10 * col`.
fn write_coast(dir: &Path) -> PathBuf {
    let data: Vec<f32> = (0..10)
        .flat_map(|_| (0..12).map(|col| if col < 6 { col as f32 - 5.0 } else { col as f32 * 10.0 }))
        .collect();
    GeoTiffFixture::new(12, 10, (-118.0, 34.0), 0.1).write_f32(dir.join("coast.tif"), &data)
}

/// Whole fixture, drawn at 10 px per cell.
fn coast_options() -> ZoomOptions {
    ZoomOptions {
        interpolation: Interpolation::Nearest,
        figure: FigureOptions {
            width_in: 12.0,
            height_in: 10.0,
            dpi: 100.0,
        },
        ..ZoomOptions::default()
    }
    .with_bounds((-118.0, -116.8), (33.0, 34.0))
}

fn save_10_dpi() -> SaveOptions {
    SaveOptions {
        dpi: 10.0,
        bbox: BBox::Tight,
    }
}

#[test]
fn test_zoom_reads_window_and_counts_below() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());

    let zoom = zoom_to_location(&path, &coast_options()).expect("Zoom failed");
    assert_eq!(zoom.elevation.shape(), (10, 12));
    assert_eq!(zoom.stats.below, 60);
    assert_eq!(zoom.stats.total, 120);
    assert_eq!(zoom.stats.percent_below(), 50.0);

    let (x, y) = zoom.window_transform.apply(0.0, 0.0);
    assert!((x + 118.0).abs() < 1e-9);
    assert!((y - 34.0).abs() < 1e-9);

    let layers = zoom.figure.axes().layers();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[1].mask().unwrap().count(), zoom.stats.below);
}

#[test]
fn test_saved_png_composites_layers() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let zoom = zoom_to_location(&path, &coast_options()).expect("Zoom failed");

    let out = dir.path().join("elevation.png");
    let size = zoom.figure.save_png(&out, &save_10_dpi()).expect("Save failed");
    assert_eq!(size, (120, 100));

    let png = image::open(&out).expect("Failed to reopen PNG").to_rgba8();
    assert_eq!(png.dimensions(), (120, 100));

    // Lowest cell: black base under a black overlay
    assert_eq!(png.get_pixel(5, 5), &Rgba([0, 0, 0, 255]));
    // 0 m: overlay at 5/6 of its ramp, 90% over the black base
    assert_eq!(png.get_pixel(55, 5), &Rgba([209, 209, 209, 255]));
    // Highest cell: white base, no overlay
    assert_eq!(png.get_pixel(115, 95), &Rgba([255, 255, 255, 255]));
}

#[test]
fn test_full_bbox_keeps_canvas() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let options = ZoomOptions {
        figure: FigureOptions {
            width_in: 14.0,
            height_in: 12.0,
            dpi: 100.0,
        },
        ..coast_options()
    };
    let zoom = zoom_to_location(&path, &options).expect("Zoom failed");

    let full = zoom
        .figure
        .render(&SaveOptions { dpi: 10.0, bbox: BBox::Full })
        .expect("Render failed");
    assert_eq!(full.dimensions(), (140, 120));
    // Letterbox margin shows the white face
    assert_eq!(full.get_pixel(0, 119), &Rgba([255, 255, 255, 255]));

    let tight = zoom.figure.render(&save_10_dpi()).expect("Render failed");
    assert!(tight.width() <= 140 && tight.height() <= 120);
    assert_eq!(tight.width(), 140);
}

#[test]
fn test_bilinear_render_is_deterministic() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let options = ZoomOptions {
        interpolation: Interpolation::Bilinear,
        ..coast_options()
    };

    let first = zoom_to_location(&path, &options).unwrap().figure.render(&save_10_dpi()).unwrap();
    let second = zoom_to_location(&path, &options).unwrap().figure.render(&save_10_dpi()).unwrap();
    assert_eq!(first.as_raw(), second.as_raw());
}

#[test]
fn test_all_above_threshold_renders_without_overlay() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let options = coast_options().with_threshold(-100.0);

    let zoom = zoom_to_location(&path, &options).expect("Zoom failed");
    assert_eq!(zoom.stats.below, 0);
    assert_eq!(zoom.figure.axes().layers()[1].visible_count(), 0);
    zoom.figure.render(&save_10_dpi()).expect("Render failed");
}

#[test]
fn test_window_outside_raster_gives_empty_figure() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let options = coast_options().with_bounds((10.0, 11.0), (10.0, 11.0));

    let zoom = zoom_to_location(&path, &options).expect("Empty window is not an error");
    assert!(zoom.elevation.is_empty());
    assert_eq!(zoom.stats.percent_below(), 0.0);

    let err = zoom
        .figure
        .save_png(dir.path().join("empty.png"), &save_10_dpi())
        .unwrap_err();
    assert!(matches!(err, PlotError::EmptyFigure));
}

#[test]
fn test_missing_file_propagates_dem_error() {
    let err = zoom_to_location("no/such/file.tif", &ZoomOptions::default()).unwrap_err();
    assert!(matches!(err, PlotError::Dem(DemError::Io(_))), "got {:?}", err);
}

#[test]
fn test_invalid_dpi_is_rejected() {
    let dir = temp_test_dir();
    let path = write_coast(dir.path());
    let zoom = zoom_to_location(&path, &coast_options()).unwrap();

    let err = zoom
        .figure
        .render(&SaveOptions { dpi: 0.0, bbox: BBox::Tight })
        .unwrap_err();
    assert!(matches!(err, PlotError::InvalidFigure(_)));
}

/// 20 x 15 raster exactly covering the default bounds, 0.1 degree pixels.
///
/// Samples are `col - 6`, so columns 0-6 are below 1 m.
fn write_default_region(dir: &Path) -> PathBuf {
    let data: Vec<f32> = (0..15)
        .flat_map(|_| (0..20).map(|col| col as f32 - 6.0))
        .collect();
    GeoTiffFixture::new(20, 15, (-118.5, 34.0), 0.1).write_f32(dir.join("region.tif"), &data)
}

#[test]
fn test_default_bounds_count_matches_independent_count() {
    let dir = temp_test_dir();
    let path = write_default_region(dir.path());

    let zoom = zoom_to_location(&path, &ZoomOptions::default()).expect("Zoom failed");
    assert_eq!(zoom.elevation.shape(), (15, 20));

    let independent = zoom.elevation.values().iter().filter(|v| **v < 1.0).count();
    assert_eq!(independent, 7 * 15);
    assert_eq!(zoom.stats.below, independent);
    assert_eq!(zoom.stats.total, 300);
    assert!((zoom.stats.percent_below() - 35.0).abs() < 1e-9);

    let (x, y) = zoom.window_transform.apply(0.0, 0.0);
    assert!((x + 118.5).abs() < 1e-9);
    assert!((y - 34.0).abs() < 1e-9);

    let (width, height) = zoom
        .figure
        .save_png(dir.path().join("elevation.png"), &SaveOptions { dpi: 20.0, bbox: BBox::Tight })
        .expect("Save failed");
    assert!(width > 0 && height > 0);
    assert!(width <= 280 && height <= 240);
}

#[test]
fn test_sd_tile_render() {
    let Some(path) = sd_data_tif() else {
        eprintln!("Skipping test: data/sd-data tile not found");
        return;
    };

    let options = ZoomOptions::default().with_bounds((-117.3, -116.2), (32.5, 33.5));
    let zoom = zoom_to_location(&path, &options).expect("Zoom failed");
    assert!(!zoom.elevation.is_empty());

    let independent = zoom.elevation.values().iter().filter(|v| **v < 1.0).count();
    assert_eq!(zoom.stats.below, independent);

    let dir = temp_test_dir();
    let (width, height) = zoom
        .figure
        .save_png(dir.path().join("elevation.png"), &SaveOptions::default())
        .expect("Save failed");
    println!("Rendered {}x{} px", width, height);
    assert!(width <= 2800 && height <= 2400);
}
