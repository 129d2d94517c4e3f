//! # lowland-dem
//!
//! Elevation raster access for single-band GeoTIFF files.
//!
//! This crate provides:
//! - [`RasterSource`]: an open GeoTIFF with its affine georeferencing
//! - [`GeoWindow`] / [`PixelWindow`]: a lon/lat rectangle and the pixel
//!   window it maps to under a raster's transform
//! - [`ElevationGrid`]: samples read from a window, with NaN-aware extrema,
//!   below-threshold masks and statistics
//!
//! ## Georeferencing
//!
//! The transform is read from `ModelTransformationTag`, or from the
//! `ModelTiepointTag` / `ModelPixelScaleTag` pair. Rasters declared as
//! pixel-is-point in the GeoKey directory are shifted half a pixel so that
//! every transform addresses pixel corners.
//!
//! ## Example
//!
//! ```no_run
//! use lowland_dem::{GeoWindow, RasterSource};
//!
//! let mut source = RasterSource::open("data/sd-data/30n120w_20101117_gmted_mea075.tif")?;
//!
//! // San Diego, lon -117.3..-116.2, lat 32.5..33.5
//! let bounds = GeoWindow::from_ranges((-117.3, -116.2), (32.5, 33.5));
//! let window = source.window_from_bounds(&bounds);
//! let elevation = source.read_window(1, window)?;
//!
//! let stats = elevation.threshold_stats(1.0);
//! println!("{:.1}% below 1 m", stats.percent_below());
//! # Ok::<(), lowland_dem::DemError>(())
//! ```

mod error;
mod grid;
mod source;
mod transform;
mod window;

pub use error::DemError;
pub use grid::{ElevationGrid, ThresholdMask, ThresholdStats};
pub use source::{RasterSource, SampleType};
pub use transform::Affine;
pub use window::{GeoWindow, PixelWindow};

/// Result type for DEM operations.
pub type Result<T> = std::result::Result<T, DemError>;
