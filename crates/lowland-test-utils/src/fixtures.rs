//! GeoTIFF fixture writer.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tiff::encoder::colortype::{self, ColorType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;

/// How the fixture is georeferenced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Georef {
    /// `ModelTiepointTag` + `ModelPixelScaleTag`, pixel-is-area.
    TiepointScale,
    /// `ModelTransformationTag`.
    Transformation,
    /// Tiepoint at the first pixel's center, flagged pixel-is-point.
    PixelIsPoint,
    /// No georeferencing tags at all.
    None,
}

/// Builder for small north-up GeoTIFFs.
///
/// `origin` is the top-left corner of the top-left pixel as `(lon, lat)`
/// and `pixel` the pixel size in degrees.
#[derive(Debug, Clone)]
pub struct GeoTiffFixture {
    pub width: u32,
    pub height: u32,
    pub origin: (f64, f64),
    pub pixel: f64,
    pub georef: Georef,
    pub rows_per_strip: u32,
    pub nodata: Option<String>,
}

impl GeoTiffFixture {
    pub fn new(width: u32, height: u32, origin: (f64, f64), pixel: f64) -> Self {
        Self {
            width,
            height,
            origin,
            pixel,
            georef: Georef::TiepointScale,
            // Several strips so windowed reads cross chunk boundaries
            rows_per_strip: 3,
            nodata: None,
        }
    }

    pub fn with_georef(mut self, georef: Georef) -> Self {
        self.georef = georef;
        self
    }

    pub fn with_rows_per_strip(mut self, rows: u32) -> Self {
        self.rows_per_strip = rows;
        self
    }

    pub fn with_nodata(mut self, nodata: &str) -> Self {
        self.nodata = Some(nodata.to_string());
        self
    }

    /// Value written at `(row, col)` by [`write_ramp`](Self::write_ramp).
    pub fn ramp_value(row: u32, col: u32) -> f32 {
        row as f32 * 100.0 + col as f32
    }

    /// Write a `Gray32Float` image whose samples are `row * 100 + col`.
    pub fn write_ramp<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let data: Vec<f32> = (0..self.height)
            .flat_map(|row| (0..self.width).map(move |col| Self::ramp_value(row, col)))
            .collect();
        self.write_f32(path, &data)
    }

    /// Write a single-band `f32` image.
    pub fn write_f32<P: AsRef<Path>>(&self, path: P, data: &[f32]) -> PathBuf {
        self.write::<colortype::Gray32Float>(path.as_ref(), data)
    }

    /// Write a single-band `i16` image.
    pub fn write_i16<P: AsRef<Path>>(&self, path: P, data: &[i16]) -> PathBuf {
        self.write::<colortype::GrayI16>(path.as_ref(), data)
    }

    /// Write a three-band interleaved `f32` image.
    pub fn write_rgb_f32<P: AsRef<Path>>(&self, path: P, data: &[f32]) -> PathBuf {
        self.write::<colortype::RGB32Float>(path.as_ref(), data)
    }

    fn write<C>(&self, path: &Path, data: &[C::Inner]) -> PathBuf
    where
        C: ColorType,
        [C::Inner]: TiffValue,
    {
        let file = File::create(path).expect("Failed to create fixture file");
        let mut encoder =
            TiffEncoder::new(BufWriter::new(file)).expect("Failed to create TIFF encoder");
        let mut image = encoder
            .new_image::<C>(self.width, self.height)
            .expect("Failed to start TIFF image");
        image
            .rows_per_strip(self.rows_per_strip)
            .expect("Failed to set rows per strip");
        self.write_georef(image.encoder());
        image.write_data(data).expect("Failed to write TIFF data");
        path.to_path_buf()
    }

    fn write_georef<W: Write + Seek, K: TiffKind>(&self, dir: &mut DirectoryEncoder<'_, W, K>) {
        let (ox, oy) = self.origin;
        let p = self.pixel;
        let tiepoint = Tag::from_u16_exhaustive(33922);
        let pixel_scale = Tag::from_u16_exhaustive(33550);

        match self.georef {
            Georef::TiepointScale => {
                dir.write_tag(tiepoint, &[0.0, 0.0, 0.0, ox, oy, 0.0][..])
                    .expect("Failed to write tiepoint");
                dir.write_tag(pixel_scale, &[p, p, 0.0][..])
                    .expect("Failed to write pixel scale");
            }
            Georef::Transformation => {
                let matrix = [
                    p, 0.0, 0.0, ox, //
                    0.0, -p, 0.0, oy, //
                    0.0, 0.0, 0.0, 0.0, //
                    0.0, 0.0, 0.0, 1.0,
                ];
                dir.write_tag(Tag::from_u16_exhaustive(34264), &matrix[..])
                    .expect("Failed to write model transformation");
            }
            Georef::PixelIsPoint => {
                let center = [0.0, 0.0, 0.0, ox + p / 2.0, oy - p / 2.0, 0.0];
                dir.write_tag(tiepoint, &center[..])
                    .expect("Failed to write tiepoint");
                dir.write_tag(pixel_scale, &[p, p, 0.0][..])
                    .expect("Failed to write pixel scale");
                // Version 1.1.0, one key: GTRasterTypeGeoKey = RasterPixelIsPoint
                let keys: [u16; 8] = [1, 1, 0, 1, 1025, 0, 1, 2];
                dir.write_tag(Tag::from_u16_exhaustive(34735), &keys[..])
                    .expect("Failed to write GeoKey directory");
            }
            Georef::None => {}
        }

        if let Some(nodata) = &self.nodata {
            dir.write_tag(Tag::from_u16_exhaustive(42113), nodata.as_str())
                .expect("Failed to write GDAL_NODATA");
        }
    }
}
