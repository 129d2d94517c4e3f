//! Shared test utilities for the lowland workspace.
//!
//! - [`GeoTiffFixture`]: writes small georeferenced GeoTIFFs for tests
//! - [`sd_data_tif`]: locates the real San Diego GMTED tile when present
//!
//! ```ignore
//! use lowland_test_utils::GeoTiffFixture;
//!
//! let dir = lowland_test_utils::temp_test_dir();
//! let path = GeoTiffFixture::new(8, 4, (-118.0, 34.0), 0.25)
//!     .write_ramp(dir.path().join("ramp.tif"));
//! ```

mod fixtures;

pub use fixtures::{GeoTiffFixture, Georef};

use std::path::{Path, PathBuf};

/// File name of the GMTED2010 mean-elevation tile covering San Diego.
pub const SD_TILE_NAME: &str = "30n120w_20101117_gmted_mea075.tif";

/// Locate the real San Diego tile under the workspace's `data/sd-data`.
///
/// Returns `None` when the data has not been downloaded; tests using it
/// should print a skip message and return.
pub fn sd_data_tif() -> Option<PathBuf> {
    let path = workspace_root().join("data").join("sd-data").join(SD_TILE_NAME);
    path.exists().then_some(path)
}

/// Root of the workspace (two levels above this crate).
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Creates a temporary directory for test output, removed on drop.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("lowland_test")
        .tempdir()
        .expect("Failed to create temporary test directory")
}
