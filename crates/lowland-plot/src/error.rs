//! Error types for rendering and export.

use lowland_dem::DemError;
use thiserror::Error;

/// Errors that can occur while building or saving a figure.
#[derive(Debug, Error)]
pub enum PlotError {
    /// Reading the elevation raster failed.
    #[error("DEM error: {0}")]
    Dem(#[from] DemError),

    /// Encoding or writing the output image failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Options could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    /// Tight export of a figure with nothing drawn.
    #[error("Figure has no image content to export")]
    EmptyFigure,

    /// Figure size or resolution cannot produce an image.
    #[error("Invalid figure: {0}")]
    InvalidFigure(String),
}
