//! Region extraction and dual-layer threshold rendering.

use crate::colormap::Normalize;
use crate::figure::{Figure, FigureOptions, ImageLayer, Interpolation};
use crate::Result;
use lowland_dem::{Affine, ElevationGrid, GeoWindow, RasterSource, ThresholdStats};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Band holding elevation samples.
const ELEVATION_BAND: u16 = 1;

/// Opacity of the below-threshold overlay.
pub const OVERLAY_ALPHA: f32 = 0.9;

/// Parameters of [`zoom_to_location`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomOptions {
    /// Elevation cutoff in meters.
    pub threshold_m: f32,
    /// `(min, max)` longitude in degrees.
    pub lon: (f64, f64),
    /// `(min, max)` latitude in degrees.
    pub lat: (f64, f64),
    pub interpolation: Interpolation,
    pub figure: FigureOptions,
}

impl Default for ZoomOptions {
    fn default() -> Self {
        Self {
            threshold_m: 1.0,
            lon: (-118.5, -116.5),
            lat: (32.5, 34.0),
            interpolation: Interpolation::default(),
            figure: FigureOptions::default(),
        }
    }
}

impl ZoomOptions {
    /// Parse options from YAML; missing fields take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn with_threshold(mut self, threshold_m: f32) -> Self {
        self.threshold_m = threshold_m;
        self
    }

    pub fn with_bounds(mut self, lon: (f64, f64), lat: (f64, f64)) -> Self {
        self.lon = lon;
        self.lat = lat;
        self
    }

    /// Requested region as a geographic window.
    pub fn bounds(&self) -> GeoWindow {
        GeoWindow::from_ranges(self.lon, self.lat)
    }
}

/// Result of [`zoom_to_location`].
#[derive(Debug, Clone)]
pub struct Zoom {
    /// Rendered figure; its [`Axes`](crate::Axes) hold the two layers.
    pub figure: Figure,
    /// Raw samples of the requested window.
    pub elevation: ElevationGrid,
    /// Transform of the window's top-left corner.
    pub window_transform: Affine,
    /// Share of samples below the threshold.
    pub stats: ThresholdStats,
}

/// Read a geographic window from `tif_path` and render it so terrain below
/// the threshold keeps its own contrast stretch.
///
/// The raster is closed before rendering starts. Read errors propagate
/// unchanged; a window outside the raster yields an empty grid and figure.
pub fn zoom_to_location<P: AsRef<Path>>(tif_path: P, options: &ZoomOptions) -> Result<Zoom> {
    let tif_path = tif_path.as_ref();
    let bounds = options.bounds();

    let (elevation, window_transform) = {
        let mut source = RasterSource::open(tif_path)?;
        let window = source.window_from_bounds(&bounds);
        debug!("Bounds {:?} map to window {:?}", bounds, window);

        let elevation = source.read_window(ELEVATION_BAND, window)?;
        (elevation, source.window_transform(&window))
    };

    let stats = elevation.threshold_stats(options.threshold_m);
    info!(
        "{}: {} of {} pixels below {} m ({:.2}%)",
        tif_path.display(),
        stats.below,
        stats.total,
        options.threshold_m,
        stats.percent_below()
    );

    let figure = render_threshold_figure(&elevation, options);

    Ok(Zoom {
        figure,
        elevation,
        window_transform,
        stats,
    })
}

/// Build the two-layer figure for `elevation`.
///
/// The base layer shows every sample stretched over
/// `[threshold, max]`; the overlay shows only samples below the threshold,
/// stretched over `[min, threshold]` at [`OVERLAY_ALPHA`].
pub fn render_threshold_figure(elevation: &ElevationGrid, options: &ZoomOptions) -> Figure {
    let threshold = options.threshold_m;
    let base_norm = Normalize::new(threshold, elevation.nanmax().unwrap_or(threshold));
    let overlay_norm = Normalize::new(elevation.nanmin().unwrap_or(threshold), threshold);
    let below = elevation.mask_below(threshold);

    debug!(
        "Base range {:?}{}, overlay range {:?}{}",
        base_norm,
        if base_norm.is_degenerate() { " (degenerate)" } else { "" },
        overlay_norm,
        if overlay_norm.is_degenerate() { " (degenerate)" } else { "" }
    );

    let mut figure = Figure::new(options.figure);
    let axes = figure.axes_mut();
    axes.imshow(
        ImageLayer::new(elevation.clone(), base_norm).with_interpolation(options.interpolation),
    );
    axes.imshow(
        ImageLayer::new(elevation.clone(), overlay_norm)
            .with_mask(below)
            .with_alpha(OVERLAY_ALPHA)
            .with_interpolation(options.interpolation),
    );
    axes.set_axis_off();
    figure.tight_layout(0.0);
    figure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ZoomOptions::default();
        assert_eq!(options.threshold_m, 1.0);
        assert_eq!(options.lon, (-118.5, -116.5));
        assert_eq!(options.lat, (32.5, 34.0));
        assert_eq!(options.interpolation, Interpolation::Bilinear);
        assert_eq!(options.bounds(), GeoWindow::new(-118.5, 32.5, -116.5, 34.0));
    }

    #[test]
    fn test_options_from_yaml() {
        let yaml = r#"
threshold_m: 2.5
lon: [-117.3, -116.2]
lat: [32.5, 33.5]
interpolation: nearest
figure:
  dpi: 72
"#;
        let options = ZoomOptions::from_yaml_str(yaml).expect("Failed to parse options");
        assert_eq!(options.threshold_m, 2.5);
        assert_eq!(options.lon, (-117.3, -116.2));
        assert_eq!(options.interpolation, Interpolation::Nearest);
        assert_eq!(options.figure.dpi, 72.0);
        assert_eq!(options.figure.width_in, 14.0);
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        let err = ZoomOptions::from_yaml_str("threshold_m: [oops").unwrap_err();
        assert!(matches!(err, crate::PlotError::Config(_)));
    }

    #[test]
    fn test_layers_in_fixed_order() {
        let elevation = ElevationGrid::new(2, 2, vec![-3.0, 0.0, 4.0, 9.0]).unwrap();
        let figure = render_threshold_figure(&elevation, &ZoomOptions::default());

        let layers = figure.axes().layers();
        assert_eq!(layers.len(), 2);
        assert!(!figure.axes().axis_visible());

        let base = &layers[0];
        assert!(base.mask().is_none());
        assert_eq!(base.norm(), Normalize::new(1.0, 9.0));
        assert_eq!(base.alpha(), 1.0);

        let overlay = &layers[1];
        assert_eq!(overlay.norm(), Normalize::new(-3.0, 1.0));
        assert_eq!(overlay.alpha(), OVERLAY_ALPHA);
        assert_eq!(overlay.mask().map(|m| m.count()), Some(2));
    }

    #[test]
    fn test_all_above_threshold_has_empty_overlay() {
        let elevation = ElevationGrid::new(1, 3, vec![5.0, 6.0, 7.0]).unwrap();
        let figure = render_threshold_figure(&elevation, &ZoomOptions::default());

        let overlay = &figure.axes().layers()[1];
        assert_eq!(overlay.visible_count(), 0);
        assert!(overlay.mask().unwrap().is_clear());
    }

    #[test]
    fn test_all_below_threshold_degenerate_base() {
        let elevation = ElevationGrid::new(1, 2, vec![-2.0, -1.0]).unwrap();
        let figure = render_threshold_figure(&elevation, &ZoomOptions::default());

        let base = &figure.axes().layers()[0];
        assert!(base.norm().is_degenerate());
        assert_eq!(figure.axes().layers()[1].visible_count(), 2);
    }

    #[test]
    fn test_single_row_grid_exports() {
        let elevation = ElevationGrid::new(1, 10000, vec![5.0; 10000]).unwrap();
        let figure = render_threshold_figure(&elevation, &ZoomOptions::default());

        let image = figure
            .render(&crate::SaveOptions::default())
            .expect("Non-empty grid must export");
        assert_eq!(image.dimensions(), (2800, 1));
    }
}
