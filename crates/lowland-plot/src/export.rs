//! PNG export of figures.

use crate::figure::Figure;
use crate::{PlotError, Result};
use image::{imageops, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Portion of the canvas written on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BBox {
    /// Crop to the drawn content.
    #[default]
    Tight,
    /// Whole canvas.
    Full,
}

/// Export settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveOptions {
    /// Output resolution in dots per inch.
    pub dpi: f32,
    pub bbox: BBox,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            dpi: 200.0,
            bbox: BBox::Tight,
        }
    }
}

impl Figure {
    /// Rasterize the figure for export.
    ///
    /// With [`BBox::Tight`] the result is cropped to the image extent (or to
    /// the axes frame when axes are visible).
    pub fn render(&self, save: &SaveOptions) -> Result<RgbaImage> {
        let options = self.options();
        if !(save.dpi.is_finite() && save.dpi > 0.0) {
            return Err(PlotError::InvalidFigure(format!("dpi must be positive, got {}", save.dpi)));
        }
        if !(options.width_in > 0.0 && options.height_in > 0.0) {
            return Err(PlotError::InvalidFigure(format!(
                "figure size must be positive, got {}x{} in",
                options.width_in, options.height_in
            )));
        }

        let canvas = self.rasterize(save.dpi);
        match save.bbox {
            BBox::Full => Ok(canvas),
            BBox::Tight => {
                let rect = if self.axes().axis_visible() {
                    Some(self.axes_rect(save.dpi)).filter(|rect| !rect.is_empty())
                } else {
                    self.image_extent(save.dpi)
                };
                let rect = rect.ok_or(PlotError::EmptyFigure)?;
                debug!("Tight bounding box {:?}", rect);
                Ok(imageops::crop_imm(&canvas, rect.x, rect.y, rect.width, rect.height).to_image())
            }
        }
    }

    /// Render and write the figure as a PNG file. Returns the image size.
    pub fn save_png<P: AsRef<Path>>(&self, path: P, save: &SaveOptions) -> Result<(u32, u32)> {
        let path = path.as_ref();
        let image = self.render(save)?;
        image.save_with_format(path, ImageFormat::Png)?;

        info!(
            "Saved {} ({}x{} px at {} dpi)",
            path.display(),
            image.width(),
            image.height(),
            save.dpi
        );
        Ok(image.dimensions())
    }
}
