//! GeoTIFF raster source with windowed reads.

use crate::grid::ElevationGrid;
use crate::transform::Affine;
use crate::window::{GeoWindow, PixelWindow};
use crate::{DemError, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::{debug, trace};

/// GeoTIFF tag numbers used for georeferencing.
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_MODEL_TRANSFORMATION: u16 = 34264;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
const TAG_GDAL_NODATA: u16 = 42113;

/// GeoKey describing whether pixel values refer to areas or points.
const GEO_KEY_RASTER_TYPE: u16 = 1025;
const RASTER_PIXEL_IS_POINT: u16 = 2;

const PLANAR_CONFIG_SEPARATE: u16 = 2;

/// Numeric type of the samples stored in a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl SampleType {
    /// Resolve from the TIFF SampleFormat code and bit depth.
    fn from_format(format: u16, bits: u8) -> Result<Self> {
        match (format, bits) {
            (1, 8) => Ok(SampleType::U8),
            (1, 16) => Ok(SampleType::U16),
            (1, 32) => Ok(SampleType::U32),
            (1, 64) => Ok(SampleType::U64),
            (2, 8) => Ok(SampleType::I8),
            (2, 16) => Ok(SampleType::I16),
            (2, 32) => Ok(SampleType::I32),
            (2, 64) => Ok(SampleType::I64),
            (3, 32) => Ok(SampleType::F32),
            (3, 64) => Ok(SampleType::F64),
            _ => Err(DemError::UnsupportedDataType(format!(
                "sample format {} with {} bits",
                format, bits
            ))),
        }
    }

    /// Whether the type is floating point.
    pub fn is_float(&self) -> bool {
        matches!(self, SampleType::F32 | SampleType::F64)
    }
}

/// An open GeoTIFF elevation raster.
///
/// Only the header and georeferencing tags are read on open; sample data is
/// decoded per window. The underlying file is closed when the source is
/// dropped, on both success and error paths.
///
/// # Example
///
/// ```no_run
/// use lowland_dem::{GeoWindow, RasterSource};
///
/// let mut source = RasterSource::open("data/sd-data/30n120w_20101117_gmted_mea075.tif")?;
/// let window = source.window_from_bounds(&GeoWindow::new(-117.3, 32.5, -116.2, 33.5));
/// let grid = source.read_window(1, window)?;
/// println!("{} x {} samples", grid.rows(), grid.cols());
/// # Ok::<(), lowland_dem::DemError>(())
/// ```
pub struct RasterSource {
    decoder: Decoder<BufReader<File>>,
    path: PathBuf,
    width: u32,
    height: u32,
    band_count: u16,
    sample_type: SampleType,
    transform: Affine,
    inverse: Affine,
    no_data: Option<f64>,
}

impl std::fmt::Debug for RasterSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSource")
            .field("path", &self.path)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("band_count", &self.band_count)
            .field("sample_type", &self.sample_type)
            .field("transform", &self.transform)
            .field("no_data", &self.no_data)
            .finish()
    }
}

impl RasterSource {
    /// Open a GeoTIFF file and read its georeferencing.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut decoder = Decoder::new(BufReader::new(file))?;

        // Large DEM strips/tiles can exceed the default buffer limits
        let mut limits = Limits::default();
        limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
        limits.ifd_value_size = 1024 * 1024 * 1024;
        decoder = decoder.with_limits(limits);

        let (width, height) = decoder.dimensions()?;
        let (band_count, bits) = Self::read_band_layout(&mut decoder)?;

        let planar = decoder
            .find_tag_unsigned::<u16>(Tag::PlanarConfiguration)?
            .unwrap_or(1);
        if planar == PLANAR_CONFIG_SEPARATE && band_count > 1 {
            return Err(DemError::UnsupportedLayout(
                "planar (band-separate) sample organization".to_string(),
            ));
        }

        // SampleFormat is optional and defaults to unsigned integer
        let format = decoder
            .find_tag_unsigned_vec::<u16>(Tag::SampleFormat)?
            .and_then(|formats| formats.first().copied())
            .unwrap_or(1);
        let sample_type = SampleType::from_format(format, bits)?;

        let transform = Self::read_geotransform(&mut decoder)?;
        let inverse = transform.inverse().ok_or_else(|| {
            DemError::InvalidGeoTiff(format!("singular geotransform {:?}", transform))
        })?;

        let no_data = Self::read_nodata_value(&mut decoder);

        debug!(
            "Opened {} ({}x{}, {} band(s), {:?}, nodata={:?})",
            path.display(),
            width,
            height,
            band_count,
            sample_type,
            no_data
        );

        Ok(Self {
            decoder,
            path: path.to_path_buf(),
            width,
            height,
            band_count,
            sample_type,
            transform,
            inverse,
            no_data,
        })
    }

    /// Number of samples per pixel and their bit depth.
    fn read_band_layout<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<(u16, u8)> {
        match decoder.colortype()? {
            ColorType::Gray(bits) => Ok((1, bits)),
            ColorType::GrayA(bits) => Ok((2, bits)),
            ColorType::RGB(bits) => Ok((3, bits)),
            ColorType::RGBA(bits) | ColorType::CMYK(bits) => Ok((4, bits)),
            other => Err(DemError::UnsupportedDataType(format!("{:?}", other))),
        }
    }

    /// Read the affine geotransform from GeoTIFF tags.
    ///
    /// `ModelTransformationTag` wins over the tiepoint/pixel-scale pair. When
    /// the GeoKey directory marks the raster as pixel-is-point, the origin is
    /// moved half a pixel so the transform addresses pixel corners.
    fn read_geotransform<R: std::io::Read + std::io::Seek>(
        decoder: &mut Decoder<R>,
    ) -> Result<Affine> {
        let transform = if let Ok(matrix) =
            decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TRANSFORMATION))
        {
            if matrix.len() < 16 {
                return Err(DemError::InvalidGeoTiff(format!(
                    "ModelTransformation has {} values, expected 16",
                    matrix.len()
                )));
            }
            Affine::new(matrix[0], matrix[1], matrix[3], matrix[4], matrix[5], matrix[7])
        } else {
            let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_TIEPOINT));
            let pixel_scale =
                decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(TAG_MODEL_PIXEL_SCALE));

            match (tiepoint, pixel_scale) {
                (Ok(tiepoint), Ok(scale)) if tiepoint.len() >= 6 && scale.len() >= 2 => {
                    // Tiepoint format: [i, j, k, x, y, z] where (i, j) is the raster
                    // location of the geographic point (x, y)
                    let (i, j) = (tiepoint[0], tiepoint[1]);
                    let (x, y) = (tiepoint[3], tiepoint[4]);
                    let (scale_x, scale_y) = (scale[0], scale[1]);

                    Affine::new(scale_x, 0.0, x - i * scale_x, 0.0, -scale_y, y + j * scale_y)
                }
                _ => {
                    return Err(DemError::InvalidGeoTiff(
                        "missing ModelTransformation or ModelTiepoint/ModelPixelScale tags"
                            .to_string(),
                    ))
                }
            }
        };

        if Self::is_pixel_is_point(decoder) {
            trace!("Raster is pixel-is-point, shifting origin by half a pixel");
            return Ok(transform.translate_pixels(-0.5, -0.5));
        }

        Ok(transform)
    }

    /// Whether `GTRasterTypeGeoKey` declares pixel-is-point.
    fn is_pixel_is_point<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> bool {
        let Ok(Some(directory)) =
            decoder.find_tag_unsigned_vec::<u16>(Tag::from_u16_exhaustive(TAG_GEO_KEY_DIRECTORY))
        else {
            return false;
        };

        // Header: [version, revision, minor, key count], then 4 shorts per key:
        // [key id, location, count, value]
        let Some(&key_count) = directory.get(3) else {
            return false;
        };
        directory
            .get(4..)
            .unwrap_or(&[])
            .chunks_exact(4)
            .take(key_count as usize)
            .any(|key| key[0] == GEO_KEY_RASTER_TYPE && key[1] == 0 && key[3] == RASTER_PIXEL_IS_POINT)
    }

    /// Try to read the no-data value from the GDAL_NODATA tag.
    fn read_nodata_value<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
        decoder
            .get_tag_ascii_string(Tag::from_u16_exhaustive(TAG_GDAL_NODATA))
            .ok()
            .and_then(|text| text.trim_matches(char::from(0)).trim().parse().ok())
    }

    /// Path the source was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pixel-to-geographic transform of the full raster.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Dimensions of the raster as `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn band_count(&self) -> u16 {
        self.band_count
    }

    pub fn sample_type(&self) -> SampleType {
        self.sample_type
    }

    /// No-data sentinel declared by the file, if any.
    pub fn no_data(&self) -> Option<f64> {
        self.no_data
    }

    /// Geographic extent of the raster.
    pub fn bounds(&self) -> GeoWindow {
        PixelWindow::full(self.width, self.height).bounds(&self.transform)
    }

    /// Pixel window covering `bounds`, clipped to the raster.
    pub fn window_from_bounds(&self, bounds: &GeoWindow) -> PixelWindow {
        PixelWindow::from_bounds(bounds, &self.inverse, (self.width, self.height))
    }

    /// Transform whose origin is the top-left corner of `window`.
    pub fn window_transform(&self, window: &PixelWindow) -> Affine {
        self.transform
            .translate_pixels(window.col_off as f64, window.row_off as f64)
    }

    /// Read a whole band.
    pub fn read(&mut self, band: u16) -> Result<ElevationGrid> {
        self.read_window(band, PixelWindow::full(self.width, self.height))
    }

    /// Read the samples of `band` (1-based) inside `window`.
    ///
    /// Only the strips or tiles intersecting the window are decoded. Samples
    /// are converted to `f32` without interpreting the no-data value.
    pub fn read_window(&mut self, band: u16, window: PixelWindow) -> Result<ElevationGrid> {
        if band == 0 || band > self.band_count {
            return Err(DemError::BandOutOfRange {
                band,
                count: self.band_count,
            });
        }

        // Window must lie inside the raster; clip rather than fail
        let col_end = window.col_end().min(self.width);
        let row_end = window.row_end().min(self.height);
        if window.is_empty() || window.col_off >= col_end || window.row_off >= row_end {
            debug!("Empty window {:?}, nothing to read", window);
            return Ok(ElevationGrid::empty());
        }
        let window = PixelWindow::new(
            window.col_off,
            window.row_off,
            col_end - window.col_off,
            row_end - window.row_off,
        );

        let (chunk_width, chunk_height) = self.decoder.chunk_dimensions();
        let layout = ChunkLayout::new(self.width, chunk_width, chunk_height);
        let samples_per_pixel = self.band_count as usize;
        let band_offset = (band - 1) as usize;
        let out_width = window.width as usize;

        let mut data = vec![0.0f32; window.len()];
        let chunks = layout.covering(&window);

        for &ChunkOrigin { index, x0, y0 } in &chunks {
            let (data_width, data_height) = self.decoder.chunk_data_dimensions(index);
            let chunk = decode_samples(self.decoder.read_chunk(index)?);

            let cols = window.col_off.max(x0)..col_end.min(x0 + data_width);
            let rows = window.row_off.max(y0)..row_end.min(y0 + data_height);

            for row in rows {
                let src_row = (row - y0) as usize * data_width as usize;
                let dst_row = (row - window.row_off) as usize * out_width;
                for col in cols.clone() {
                    let src = (src_row + (col - x0) as usize) * samples_per_pixel + band_offset;
                    let dst = dst_row + (col - window.col_off) as usize;
                    data[dst] = chunk.get(src).copied().ok_or_else(|| {
                        DemError::InvalidGeoTiff(format!(
                            "chunk {} is shorter than its declared size",
                            index
                        ))
                    })?;
                }
            }
        }

        trace!(
            "Read window {:?} of band {} from {} chunk(s)",
            window,
            band,
            chunks.len()
        );

        ElevationGrid::new(window.height as usize, window.width as usize, data)
    }
}

/// Strip or tile grid of a raster, in row-major chunk order.
///
/// Strips are the single-column case where the chunk is as wide as the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkLayout {
    chunk_width: u32,
    chunk_height: u32,
    chunks_across: u32,
}

/// Index of a chunk and the pixel position of its top-left sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkOrigin {
    index: u32,
    x0: u32,
    y0: u32,
}

impl ChunkLayout {
    fn new(raster_width: u32, chunk_width: u32, chunk_height: u32) -> Self {
        Self {
            chunk_width,
            chunk_height,
            chunks_across: raster_width.div_ceil(chunk_width),
        }
    }

    /// Chunks intersecting a non-empty `window`, row by row.
    fn covering(&self, window: &PixelWindow) -> Vec<ChunkOrigin> {
        let first_row = window.row_off / self.chunk_height;
        let last_row = (window.row_end() - 1) / self.chunk_height;
        let first_col = window.col_off / self.chunk_width;
        let last_col = (window.col_end() - 1) / self.chunk_width;

        (first_row..=last_row)
            .flat_map(|chunk_row| {
                (first_col..=last_col).map(move |chunk_col| ChunkOrigin {
                    index: chunk_row * self.chunks_across + chunk_col,
                    x0: chunk_col * self.chunk_width,
                    y0: chunk_row * self.chunk_height,
                })
            })
            .collect()
    }
}

/// Convert decoded samples of any supported type to `f32`.
fn decode_samples(result: DecodingResult) -> Vec<f32> {
    match result {
        DecodingResult::F32(data) => data,
        DecodingResult::F64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U16(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U32(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::U64(data) => data.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I64(data) => data.into_iter().map(|v| v as f32).collect(),
    }
}
