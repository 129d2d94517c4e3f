//! Renders the San Diego elevation map below/above 1 m to `elevation.png`.
//!
//! Inputs and outputs are fixed; run from the workspace root so the data
//! directory resolves.

use lowland_plot::{zoom_to_location, BBox, PlotError, SaveOptions, ZoomOptions};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DATA_DIR: &str = "data/sd-data";

/// GMTED2010 mean elevation, 7.5 arc-second tile at 30N 120W.
const TIF_NAME: &str = "30n120w_20101117_gmted_mea075.tif";

const OUTPUT_PATH: &str = "elevation.png";
const OUTPUT_DPI: f32 = 200.0;

const SAN_DIEGO_LON: (f64, f64) = (-117.3, -116.2);
const SAN_DIEGO_LAT: (f64, f64) = (32.5, 33.5);
const THRESHOLD_M: f32 = 1.0;

fn main() -> Result<(), PlotError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let tif_path = Path::new(DATA_DIR).join(TIF_NAME);
    let options = ZoomOptions::default()
        .with_threshold(THRESHOLD_M)
        .with_bounds(SAN_DIEGO_LON, SAN_DIEGO_LAT);

    info!("Rendering {} for lon {:?}, lat {:?}", tif_path.display(), options.lon, options.lat);
    let zoom = zoom_to_location(&tif_path, &options)?;

    zoom.figure.save_png(
        OUTPUT_PATH,
        &SaveOptions {
            dpi: OUTPUT_DPI,
            bbox: BBox::Tight,
        },
    )?;

    drop(zoom);
    Ok(())
}
