//! Coastline-based map calibration.
//!
//! Given a raster map that shows a coastline as a dark line on a light
//! background, and reference lon/lat coordinates of that coastline, recover
//! the affine transform taking `[lon, lat, 1]` to pixel `[x, y]` and its
//! inverse.
//!
//! Pipeline:
//! 1. Threshold the raster into a point cloud of dark pixels ([`feature`]).
//! 2. Seed an axis-aligned affine from the two bounding boxes ([`init`]).
//! 3. Refine with affine ICP: nearest-neighbour matches from a k-d tree,
//!    weighted least-squares refit, repeat until the residual settles ([`icp`]).
//! 4. Package the affine, its inverse and the boxes into a
//!    [`CalibrationResult`].
//!
//! ## Quickstart
//!
//! ```no_run
//! use coastcal::{calibrate_path, read_coastline_csv, CalibrationParams, GeoPoint};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let coastline = read_coastline_csv("uk_coast.csv")?;
//! let cal = calibrate_path("uk_map.png", &coastline, None, &CalibrationParams::default())?;
//! let px = cal.lonlat_to_xy(GeoPoint::new(-1.3, 52.9));
//! println!("(-1.3, 52.9) -> ({:.1}, {:.1})", px.x, px.y);
//! cal.write_json("uk_map_calibration.json")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `coastcal::core`: geometry value types, [`core::Affine2`], grayscale view, logger.
//! - [`CoastlineCalibrator`]: configured pipeline with diagnostics.
//! - [`calibrate`], [`calibrate_gray_u8`], and with feature `image`
//!   `calibrate_image` / `calibrate_path`: one-shot entry points.
//! - [`io`]: coastline CSV reader and the JSON artifact.

pub use coastcal_core as core;

mod calibrate;
mod calibrator;
mod error;
pub mod feature;
pub mod icp;
pub mod init;
pub mod io;
mod params;
mod result;

pub use calibrate::{calibrate, calibrate_gray_u8};
#[cfg(feature = "image")]
pub use calibrate::{calibrate_image, calibrate_path, gray_view};
pub use calibrator::{Calibration, CoastlineCalibrator, MIN_COASTLINE_POINTS};
pub use error::{CalibrationError, FitStage};
pub use io::{parse_coastline_csv, read_coastline_csv, CalibrateMapConfig, CalibrationIoError};
pub use params::{
    CalibrationParams, FeatureParams, IcpParams, InitParams, LatitudeAxis, OutlierRejection,
    Threshold,
};
pub use result::{CalibrationRecord, CalibrationResult};

pub use coastcal_core::{GeoBoundingBox, GeoPoint, PixelBoundingBox, PixelPoint};
