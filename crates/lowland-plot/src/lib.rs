//! # lowland-plot
//!
//! Renders an elevation window so land below a threshold stands out from
//! land above it.
//!
//! Two grayscale layers are drawn on one explicit [`Figure`]:
//! - the base layer shows every sample, stretched over `[threshold, max]`,
//!   so everything below the threshold clamps to black
//! - the overlay shows only below-threshold samples, stretched over
//!   `[min, threshold]` at 90% opacity, so low-lying topography keeps its
//!   own contrast
//!
//! ## Example
//!
//! ```no_run
//! use lowland_plot::{zoom_to_location, SaveOptions, ZoomOptions};
//!
//! let options = ZoomOptions::default().with_bounds((-117.3, -116.2), (32.5, 33.5));
//! let zoom = zoom_to_location("data/sd-data/30n120w_20101117_gmted_mea075.tif", &options)?;
//! println!("{:.1}% below {} m", zoom.stats.percent_below(), options.threshold_m);
//!
//! zoom.figure.save_png("elevation.png", &SaveOptions::default())?;
//! # Ok::<(), lowland_plot::PlotError>(())
//! ```

mod colormap;
mod error;
mod export;
mod figure;
mod zoom;

pub use colormap::{greys_r, Normalize};
pub use error::PlotError;
pub use export::{BBox, SaveOptions};
pub use figure::{Axes, Figure, FigureOptions, ImageLayer, Interpolation, Margins, PixelRect};
pub use zoom::{render_threshold_figure, zoom_to_location, Zoom, ZoomOptions, OVERLAY_ALPHA};

/// Result type for plotting operations.
pub type Result<T> = std::result::Result<T, PlotError>;
