use std::{env, path::PathBuf, time::Instant};

use coastcal::{gray_view, CalibrateMapConfig, CoastlineCalibrator, GeoPoint, PixelPoint};
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let config_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("testdata/calibrate_map_config.json"));

    let cfg = CalibrateMapConfig::load_json(&config_path)?;
    init_logging(&cfg.log_level);

    let coastline = cfg.load_coastline()?;
    log::info!(
        "loaded {} coastline vertices from {}",
        coastline.len(),
        cfg.coastline_path
    );

    let img = image::open(&cfg.image_path)?.to_luma8();
    let calibrator = CoastlineCalibrator::new(cfg.params.clone());

    let t0 = Instant::now();
    let cal = calibrator.calibrate_detailed(&gray_view(&img), &coastline, cfg.pixel_bbox())?;
    let dt = t0.elapsed().as_millis() as u64;
    log::info!(
        "calibration finished duration_ms={} iterations={} rms={:.3}px converged={}",
        dt,
        cal.icp.iterations,
        cal.icp.rms(),
        cal.icp.converged
    );

    let result = &cal.result;
    let [left, top, right, bottom] = result.pixel_bbox().to_array();
    let corners = [
        PixelPoint::new(left as f64, top as f64),
        PixelPoint::new(right as f64, bottom as f64),
    ];
    for p in corners {
        let g = result.xy_to_lonlat(p);
        println!("pixel ({:.0}, {:.0}) -> lon {:.4}, lat {:.4}", p.x, p.y, g.lon, g.lat);
    }
    let probe = coastline.first().copied().unwrap_or(GeoPoint::new(0.0, 0.0));
    let px = result.lonlat_to_xy(probe);
    println!(
        "first vertex ({:.4}, {:.4}) -> pixel ({:.1}, {:.1})",
        probe.lon, probe.lat, px.x, px.y
    );

    let out_path = cfg.output_path();
    result.write_json(&out_path)?;
    println!("wrote calibration to {}", out_path.display());
    Ok(())
}

fn init_logging(level: &str) {
    // A subscriber or logger may already be installed; keep the first one.
    #[cfg(feature = "tracing")]
    {
        let _ = LogTracer::init();
        coastcal::core::init_tracing(coastcal::core::parse_level(level), false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        let _ = coastcal::core::init_with_level(coastcal::core::parse_level(level));
    }
}
