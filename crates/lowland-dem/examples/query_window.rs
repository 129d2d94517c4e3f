//! Example: Read a geographic window from a GeoTIFF and report its statistics.
//!
//! Usage: cargo run --example query_window -- <tif> <west> <south> <east> <north> [threshold_m]

use lowland_dem::{GeoWindow, RasterSource};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 6 {
        eprintln!("Usage: {} <tif> <west> <south> <east> <north> [threshold_m]", args[0]);
        eprintln!(
            "Example: {} data/sd-data/30n120w_20101117_gmted_mea075.tif -117.3 32.5 -116.2 33.5",
            args[0]
        );
        std::process::exit(1);
    }

    let coord = |i: usize| -> f64 { args[i].parse().expect("Invalid coordinate") };
    let bounds = GeoWindow::new(coord(2), coord(3), coord(4), coord(5));
    let threshold: f32 = args
        .get(6)
        .map(|s| s.parse().expect("Invalid threshold"))
        .unwrap_or(1.0);

    let start = Instant::now();
    let mut source = RasterSource::open(&args[1]).expect("Failed to open raster");
    let (width, height) = source.dimensions();
    let extent = source.bounds();
    println!(
        "{}x{} pixels, lon {:.3}° to {:.3}°, lat {:.3}° to {:.3}°",
        width, height, extent.west, extent.east, extent.south, extent.north
    );

    let window = source.window_from_bounds(&bounds);
    println!("Window: {:?}", window);

    let grid = match source.read_window(1, window) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    println!(
        "Read {}x{} samples in {:.3}s",
        grid.rows(),
        grid.cols(),
        start.elapsed().as_secs_f64()
    );

    let stats = grid.threshold_stats(threshold);
    println!(
        "{} of {} samples below {} m ({:.2}%)",
        stats.below,
        stats.total,
        threshold,
        stats.percent_below()
    );
    if let (Some(min), Some(max)) = (grid.nanmin(), grid.nanmax()) {
        println!("Elevation range: {:.1} m to {:.1} m", min, max);
    }
}
