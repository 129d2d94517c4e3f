//! Explicit drawing surface: a figure owning one axes of stacked image layers.

use crate::colormap::{greys_r, Normalize};
use image::{Rgba, RgbaImage};
use lowland_dem::{ElevationGrid, ThresholdMask};
use serde::{Deserialize, Serialize};

/// Physical size and default resolution of a figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureOptions {
    /// Width in inches.
    pub width_in: f32,
    /// Height in inches.
    pub height_in: f32,
    /// Dots per inch used when no export resolution is given.
    pub dpi: f32,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width_in: 14.0,
            height_in: 12.0,
            dpi: 100.0,
        }
    }
}

/// Resampling used when an image layer is drawn at a different size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
}

/// Axes position as fractions of the figure, measured from the bottom-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            left: 0.125,
            right: 0.9,
            bottom: 0.11,
            top: 0.88,
        }
    }
}

/// Rectangle in canvas pixels, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A grid drawn through a grayscale ramp.
#[derive(Debug, Clone)]
pub struct ImageLayer {
    grid: ElevationGrid,
    mask: Option<ThresholdMask>,
    norm: Normalize,
    alpha: f32,
    interpolation: Interpolation,
}

impl ImageLayer {
    /// Opaque, unmasked, bilinear layer.
    pub fn new(grid: ElevationGrid, norm: Normalize) -> Self {
        Self {
            grid,
            mask: None,
            norm,
            alpha: 1.0,
            interpolation: Interpolation::default(),
        }
    }

    /// Only draw cells where `mask` is set; the rest is transparent.
    pub fn with_mask(mut self, mask: ThresholdMask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn grid(&self) -> &ElevationGrid {
        &self.grid
    }

    pub fn mask(&self) -> Option<&ThresholdMask> {
        self.mask.as_ref()
    }

    pub fn norm(&self) -> Normalize {
        self.norm
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    /// Number of cells that can be drawn (finite and not masked out).
    pub fn visible_count(&self) -> usize {
        let (rows, cols) = self.grid.shape();
        (0..rows)
            .flat_map(|row| (0..cols).map(move |col| (row, col)))
            .filter(|&(row, col)| self.visible_value(row, col).is_some())
            .count()
    }

    fn visible_value(&self, row: usize, col: usize) -> Option<f32> {
        let value = self.grid.get(row, col)?;
        if value.is_nan() {
            return None;
        }
        if let Some(mask) = &self.mask {
            if !mask.get(row, col)? {
                return None;
            }
        }
        Some(value)
    }

    /// Gray level and opacity at fractional cell coordinates.
    ///
    /// `(u, v)` are in cell-center space: `(0, 0)` is the center of the
    /// top-left cell. Returns `None` where nothing is drawn.
    fn sample(&self, u: f64, v: f64) -> Option<(u8, f32)> {
        let (rows, cols) = self.grid.shape();
        if rows == 0 || cols == 0 {
            return None;
        }
        let clamp_col = |c: f64| (c.max(0.0) as usize).min(cols - 1);
        let clamp_row = |r: f64| (r.max(0.0) as usize).min(rows - 1);

        let (value, coverage) = match self.interpolation {
            Interpolation::Nearest => {
                let col = clamp_col((u + 0.5).floor());
                let row = clamp_row((v + 0.5).floor());
                (self.visible_value(row, col)?, 1.0)
            }
            Interpolation::Bilinear => {
                let (x0, y0) = (u.floor(), v.floor());
                let (fx, fy) = (u - x0, v - y0);
                let neighbors = [
                    (x0, y0, (1.0 - fx) * (1.0 - fy)),
                    (x0 + 1.0, y0, fx * (1.0 - fy)),
                    (x0, y0 + 1.0, (1.0 - fx) * fy),
                    (x0 + 1.0, y0 + 1.0, fx * fy),
                ];

                let mut acc = 0.0f64;
                let mut weight = 0.0f64;
                for (x, y, w) in neighbors {
                    if w <= 0.0 {
                        continue;
                    }
                    if let Some(value) = self.visible_value(clamp_row(y), clamp_col(x)) {
                        acc += value as f64 * w;
                        weight += w;
                    }
                }
                if weight <= 0.0 {
                    return None;
                }
                ((acc / weight) as f32, weight as f32)
            }
        };

        let t = self.norm.apply(value)?;
        Some((greys_r(t), self.alpha * coverage))
    }
}

/// Drawing context: image layers drawn in insertion order.
#[derive(Debug, Clone)]
pub struct Axes {
    layers: Vec<ImageLayer>,
    axis_visible: bool,
    margins: Margins,
}

impl Default for Axes {
    fn default() -> Self {
        Self {
            layers: Vec::new(),
            axis_visible: true,
            margins: Margins::default(),
        }
    }
}

impl Axes {
    /// Add a layer on top of those already drawn.
    pub fn imshow(&mut self, layer: ImageLayer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[ImageLayer] {
        &self.layers
    }

    /// Hide the frame and all axis decoration.
    pub fn set_axis_off(&mut self) {
        self.axis_visible = false;
    }

    pub fn axis_visible(&self) -> bool {
        self.axis_visible
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    /// Shape of the drawn data, taken from the bottom layer.
    fn data_shape(&self) -> Option<(usize, usize)> {
        self.layers
            .first()
            .map(|layer| layer.grid.shape())
            .filter(|&(rows, cols)| rows > 0 && cols > 0)
    }
}

/// In-memory figure. Nothing global: each figure is built, saved and dropped.
#[derive(Debug, Clone)]
pub struct Figure {
    options: FigureOptions,
    face: Rgba<u8>,
    axes: Axes,
}

impl Figure {
    /// Figure with a white face and one empty axes.
    pub fn new(options: FigureOptions) -> Self {
        Self {
            options,
            face: Rgba([255, 255, 255, 255]),
            axes: Axes::default(),
        }
    }

    pub fn options(&self) -> FigureOptions {
        self.options
    }

    pub fn axes(&self) -> &Axes {
        &self.axes
    }

    pub fn axes_mut(&mut self) -> &mut Axes {
        &mut self.axes
    }

    pub fn face(&self) -> Rgba<u8> {
        self.face
    }

    /// Fit the axes to the figure, leaving `pad_in` inches on every side.
    pub fn tight_layout(&mut self, pad_in: f32) {
        let pad_x = (pad_in / self.options.width_in).clamp(0.0, 0.5);
        let pad_y = (pad_in / self.options.height_in).clamp(0.0, 0.5);
        self.axes.margins = Margins {
            left: pad_x,
            right: 1.0 - pad_x,
            bottom: pad_y,
            top: 1.0 - pad_y,
        };
    }

    /// Canvas size in pixels at `dpi`.
    pub fn canvas_size(&self, dpi: f32) -> (u32, u32) {
        (
            (self.options.width_in * dpi).round().max(0.0) as u32,
            (self.options.height_in * dpi).round().max(0.0) as u32,
        )
    }

    /// Axes rectangle in canvas pixels at `dpi`.
    pub fn axes_rect(&self, dpi: f32) -> PixelRect {
        let (width, height) = self.canvas_size(dpi);
        let m = self.axes.margins;
        let x0 = (m.left * width as f32).round() as u32;
        let x1 = (m.right * width as f32).round() as u32;
        let y0 = ((1.0 - m.top) * height as f32).round() as u32;
        let y1 = ((1.0 - m.bottom) * height as f32).round() as u32;
        PixelRect {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0),
            height: y1.saturating_sub(y0),
        }
    }

    /// Where the image is drawn at `dpi`: the data scaled uniformly to fit
    /// the axes (equal aspect) and centered. `None` if there is no data.
    pub fn image_extent(&self, dpi: f32) -> Option<PixelRect> {
        let (rows, cols) = self.axes.data_shape()?;
        let axes = self.axes_rect(dpi);
        if axes.is_empty() {
            return None;
        }

        let scale = (axes.width as f64 / cols as f64).min(axes.height as f64 / rows as f64);
        // A non-empty grid always covers at least one output pixel per side
        let width = (cols as f64 * scale).round().max(1.0) as u32;
        let height = (rows as f64 * scale).round().max(1.0) as u32;
        let rect = PixelRect {
            x: axes.x + (axes.width - width.min(axes.width)) / 2,
            y: axes.y + (axes.height - height.min(axes.height)) / 2,
            width: width.min(axes.width),
            height: height.min(axes.height),
        };
        (!rect.is_empty()).then_some(rect)
    }

    /// Draw the whole canvas at `dpi`.
    pub fn rasterize(&self, dpi: f32) -> RgbaImage {
        let (width, height) = self.canvas_size(dpi);
        let mut canvas = RgbaImage::from_pixel(width, height, self.face);

        if let (Some(extent), Some((rows, cols))) = (self.image_extent(dpi), self.axes.data_shape()) {
            let sx = cols as f64 / extent.width as f64;
            let sy = rows as f64 / extent.height as f64;

            for py in 0..extent.height {
                let v = (py as f64 + 0.5) * sy - 0.5;
                for px in 0..extent.width {
                    let u = (px as f64 + 0.5) * sx - 0.5;
                    let pixel = canvas.get_pixel_mut(extent.x + px, extent.y + py);
                    for layer in &self.axes.layers {
                        if let Some((gray, alpha)) = layer.sample(u, v) {
                            blend_over(pixel, gray, alpha);
                        }
                    }
                }
            }
        }

        if self.axes.axis_visible {
            draw_frame(&mut canvas, self.axes_rect(dpi));
        }

        canvas
    }
}

/// Composite a gray source with straight alpha over `dst`.
fn blend_over(dst: &mut Rgba<u8>, gray: u8, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    let src_a = alpha.min(1.0);
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }

    for channel in 0..3 {
        let c = (gray as f32 * src_a + dst[channel] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[channel] = c.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// One-pixel black frame just inside `rect`.
fn draw_frame(canvas: &mut RgbaImage, rect: PixelRect) {
    if rect.is_empty() {
        return;
    }
    let black = Rgba([0, 0, 0, 255]);
    let right = (rect.x + rect.width - 1).min(canvas.width().saturating_sub(1));
    let bottom = (rect.y + rect.height - 1).min(canvas.height().saturating_sub(1));

    for x in rect.x..=right {
        canvas.put_pixel(x, rect.y, black);
        canvas.put_pixel(x, bottom, black);
    }
    for y in rect.y..=bottom {
        canvas.put_pixel(rect.x, y, black);
        canvas.put_pixel(right, y, black);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: usize, cols: usize, data: Vec<f32>) -> ElevationGrid {
        ElevationGrid::new(rows, cols, data).unwrap()
    }

    #[test]
    fn test_blend_over_opaque_face() {
        let mut pixel = Rgba([255, 255, 255, 255]);
        blend_over(&mut pixel, 0, 0.9);
        assert_eq!(pixel, Rgba([26, 26, 26, 255]));

        let mut pixel = Rgba([255, 255, 255, 255]);
        blend_over(&mut pixel, 100, 1.0);
        assert_eq!(pixel, Rgba([100, 100, 100, 255]));
    }

    #[test]
    fn test_nearest_sample_respects_mask() {
        let elevation = grid(1, 2, vec![-1.0, 5.0]);
        let mask = elevation.mask_below(1.0);
        let layer = ImageLayer::new(elevation, Normalize::new(-1.0, 1.0))
            .with_mask(mask)
            .with_alpha(0.9)
            .with_interpolation(Interpolation::Nearest);

        assert_eq!(layer.sample(0.0, 0.0), Some((0, 0.9)));
        assert_eq!(layer.sample(1.0, 0.0), None);
        assert_eq!(layer.visible_count(), 1);
    }

    #[test]
    fn test_bilinear_blends_values_and_coverage() {
        let elevation = grid(1, 2, vec![0.0, 10.0]);
        let layer = ImageLayer::new(elevation.clone(), Normalize::new(0.0, 10.0));
        let (gray, alpha) = layer.sample(0.5, 0.0).unwrap();
        assert_eq!(gray, greys_r(0.5));
        assert_eq!(alpha, 1.0);

        // Halfway to a masked-out cell: value of the visible cell, half coverage
        let mask = elevation.mask_below(5.0);
        let masked = ImageLayer::new(elevation, Normalize::new(0.0, 10.0)).with_mask(mask);
        let (gray, alpha) = masked.sample(0.5, 0.0).unwrap();
        assert_eq!(gray, 0);
        assert!((alpha - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_nan_is_transparent() {
        let layer = ImageLayer::new(grid(1, 1, vec![f32::NAN]), Normalize::new(0.0, 1.0));
        assert_eq!(layer.sample(0.0, 0.0), None);
        assert_eq!(layer.visible_count(), 0);
    }

    #[test]
    fn test_image_extent_keeps_aspect() {
        let mut figure = Figure::new(FigureOptions {
            width_in: 4.0,
            height_in: 2.0,
            dpi: 10.0,
        });
        figure.axes_mut().imshow(ImageLayer::new(grid(1, 1, vec![0.0]), Normalize::new(0.0, 1.0)));
        figure.tight_layout(0.0);

        assert_eq!(figure.canvas_size(10.0), (40, 20));
        let extent = figure.image_extent(10.0).unwrap();
        assert_eq!(extent, PixelRect { x: 10, y: 0, width: 20, height: 20 });
    }

    #[test]
    fn test_elongated_grid_keeps_one_pixel_side() {
        let mut figure = Figure::new(FigureOptions {
            width_in: 4.0,
            height_in: 2.0,
            dpi: 10.0,
        });
        figure
            .axes_mut()
            .imshow(ImageLayer::new(grid(1, 1000, vec![5.0; 1000]), Normalize::new(0.0, 10.0)));
        figure.tight_layout(0.0);

        let extent = figure.image_extent(10.0).unwrap();
        assert_eq!(extent, PixelRect { x: 0, y: 9, width: 40, height: 1 });
    }

    #[test]
    fn test_empty_figure_has_no_extent() {
        let figure = Figure::new(FigureOptions::default());
        assert!(figure.image_extent(100.0).is_none());
        assert!(figure.axes().axis_visible());
    }

    #[test]
    fn test_rasterize_draws_layers_in_order() {
        let mut figure = Figure::new(FigureOptions {
            width_in: 2.0,
            height_in: 1.0,
            dpi: 2.0,
        });
        let elevation = grid(1, 2, vec![-1.0, 3.0]);
        let mask = elevation.mask_below(1.0);
        let axes = figure.axes_mut();
        axes.imshow(
            ImageLayer::new(elevation.clone(), Normalize::new(1.0, 3.0))
                .with_interpolation(Interpolation::Nearest),
        );
        axes.imshow(
            ImageLayer::new(elevation, Normalize::new(-1.0, 1.0))
                .with_mask(mask)
                .with_alpha(0.5)
                .with_interpolation(Interpolation::Nearest),
        );
        axes.set_axis_off();
        figure.tight_layout(0.0);

        let canvas = figure.rasterize(2.0);
        assert_eq!(canvas.dimensions(), (4, 2));
        // Below: base clamps to black, overlay maps to black at half opacity
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([0, 0, 0, 255]));
        // Above: base maps 3.0 to white, overlay is transparent
        assert_eq!(canvas.get_pixel(3, 1), &Rgba([255, 255, 255, 255]));
    }
}
