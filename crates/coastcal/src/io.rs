//! Coastline CSV input, calibration artifact JSON and the example config.

use crate::{CalibrationError, CalibrationParams, CalibrationResult};
use coastcal_core::{GeoPoint, PixelBoundingBox};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum CalibrationIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("no valid lon,lat rows found in coastline CSV")]
    NoValidRows,
    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Parse `lon,lat` rows.
///
/// Rows with fewer than two fields, or whose first two fields are not
/// numbers, are skipped; this also skips a header line. Extra columns are
/// ignored. Fields may be wrapped in double quotes.
pub fn parse_coastline_csv(text: &str) -> Result<Vec<GeoPoint>, CalibrationIoError> {
    let points: Vec<GeoPoint> = text.lines().filter_map(parse_row).collect();
    if points.is_empty() {
        return Err(CalibrationIoError::NoValidRows);
    }
    Ok(points)
}

fn parse_row(line: &str) -> Option<GeoPoint> {
    let mut fields = line.split(',');
    let lon = parse_field(fields.next()?)?;
    let lat = parse_field(fields.next()?)?;
    Some(GeoPoint::new(lon, lat))
}

fn parse_field(field: &str) -> Option<f64> {
    let field = field.trim();
    let field = field
        .strip_prefix('"')
        .and_then(|f| f.strip_suffix('"'))
        .unwrap_or(field);
    field.trim().parse().ok()
}

/// Read a coastline CSV from disk.
pub fn read_coastline_csv(path: impl AsRef<Path>) -> Result<Vec<GeoPoint>, CalibrationIoError> {
    let raw = fs::read_to_string(path)?;
    parse_coastline_csv(&raw)
}

impl CalibrationResult {
    /// Load a calibration artifact from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this calibration to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), CalibrationIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration for the `calibrate_map` example.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrateMapConfig {
    pub image_path: String,
    pub coastline_path: String,
    #[serde(default)]
    pub output_path: Option<String>,
    /// `[left, top, right, bottom]`, right/bottom exclusive.
    #[serde(default)]
    pub pixel_bbox: Option<[i32; 4]>,
    #[serde(default)]
    pub params: CalibrationParams,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl CalibrateMapConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CalibrationIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve the output artifact path.
    pub fn output_path(&self) -> PathBuf {
        self.output_path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("map_calibration.json"))
    }

    pub fn pixel_bbox(&self) -> Option<PixelBoundingBox> {
        self.pixel_bbox.map(PixelBoundingBox::from_array)
    }

    pub fn load_coastline(&self) -> Result<Vec<GeoPoint>, CalibrationIoError> {
        read_coastline_csv(&self.coastline_path)
    }
}
