use crate::{CalibrationError, FitStage};
use coastcal_core::{Affine2, GeoBoundingBox, GeoPoint, PixelBoundingBox, PixelPoint};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Per-coefficient tolerance, relative to `max(1, |coefficient|)`, when
/// checking a stored inverse against the recomputed one.
const INVERSE_TOLERANCE: f64 = 1e-6;

/// Final lon/lat <-> pixel calibration.
///
/// Serializes as the flat artifact record consumed by map rendering:
/// `affine`, `inverse` (2x3 nested arrays), `pixel_bbox` and `bounds_geo`
/// (4-element arrays). Deserialization re-derives the inverse and rejects
/// records whose affine is singular or whose stored inverse disagrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CalibrationRecord", into = "CalibrationRecord")]
pub struct CalibrationResult {
    affine: Affine2,
    inverse: Affine2,
    pixel_bbox: PixelBoundingBox,
    bounds_geo: GeoBoundingBox,
}

impl CalibrationResult {
    /// Package a fitted affine, deriving its inverse.
    pub fn new(
        affine: Affine2,
        pixel_bbox: PixelBoundingBox,
        bounds_geo: GeoBoundingBox,
    ) -> Result<Self, CalibrationError> {
        let inverse = affine
            .inverse()
            .ok_or_else(|| CalibrationError::singular(FitStage::Inverse))?;
        Ok(Self {
            affine,
            inverse,
            pixel_bbox,
            bounds_geo,
        })
    }

    /// lon/lat -> pixel map.
    #[inline]
    pub fn affine(&self) -> &Affine2 {
        &self.affine
    }

    /// pixel -> lon/lat map.
    #[inline]
    pub fn inverse(&self) -> &Affine2 {
        &self.inverse
    }

    /// Pixel region the fit was seeded from.
    #[inline]
    pub fn pixel_bbox(&self) -> PixelBoundingBox {
        self.pixel_bbox
    }

    /// Extent of the reference coastline.
    #[inline]
    pub fn bounds_geo(&self) -> GeoBoundingBox {
        self.bounds_geo
    }

    pub fn lonlat_to_xy(&self, g: GeoPoint) -> PixelPoint {
        self.affine.apply(g.to_point()).into()
    }

    pub fn xy_to_lonlat(&self, p: PixelPoint) -> GeoPoint {
        let q = self.inverse.apply(p.to_point());
        GeoPoint::new(q.x, q.y)
    }

    /// Geographic rectangle covered by the pixel bbox, from its corners
    /// mapped through the inverse.
    pub fn pixel_bbox_geo_bounds(&self) -> GeoBoundingBox {
        let bb = &self.pixel_bbox;
        let (l, t, r, b) = (bb.left as f64, bb.top as f64, bb.right as f64, bb.bottom as f64);
        let corners = [
            Point2::new(l, t),
            Point2::new(r, t),
            Point2::new(r, b),
            Point2::new(l, b),
        ]
        .map(|c| {
            let g = self.inverse.apply(c);
            GeoPoint::new(g.x, g.y)
        });
        // Four corners, never empty.
        GeoBoundingBox::enclosing(&corners).unwrap_or(self.bounds_geo)
    }
}

/// On-disk layout of [`CalibrationResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationRecord {
    pub affine: [[f64; 3]; 2],
    pub inverse: [[f64; 3]; 2],
    pub pixel_bbox: [i32; 4],
    pub bounds_geo: [f64; 4],
}

impl From<CalibrationResult> for CalibrationRecord {
    fn from(r: CalibrationResult) -> Self {
        Self {
            affine: r.affine.to_rows(),
            inverse: r.inverse.to_rows(),
            pixel_bbox: r.pixel_bbox.to_array(),
            bounds_geo: r.bounds_geo.to_array(),
        }
    }
}

impl TryFrom<CalibrationRecord> for CalibrationResult {
    type Error = CalibrationError;

    fn try_from(r: CalibrationRecord) -> Result<Self, Self::Error> {
        let result = Self::new(
            Affine2::from_rows(r.affine),
            PixelBoundingBox::from_array(r.pixel_bbox),
            GeoBoundingBox::from_array(r.bounds_geo),
        )?;

        let computed = result.inverse.to_rows();
        let mut deviation = 0.0_f64;
        for (stored_row, computed_row) in r.inverse.iter().zip(&computed) {
            for (&s, &c) in stored_row.iter().zip(computed_row) {
                let d = (s - c).abs() / c.abs().max(1.0);
                // NaN counts as an infinite deviation.
                deviation = if d.is_nan() { f64::INFINITY } else { deviation.max(d) };
            }
        }
        if deviation > INVERSE_TOLERANCE {
            return Err(CalibrationError::InverseMismatch { deviation });
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> CalibrationResult {
        CalibrationResult::new(
            Affine2::from_rows([[60.0, 5.0, 450.0], [2.0, -70.0, 4300.0]]),
            PixelBoundingBox::new(226, 216, 866, 676),
            GeoBoundingBox::new(-8.0, 52.0, 2.0, 58.0),
        )
        .expect("invertible")
    }

    #[test]
    fn inverse_is_consistent_for_pixels_and_lonlat() {
        let cal = sample();
        for p in [
            PixelPoint::new(0.0, 0.0),
            PixelPoint::new(450.5, 317.25),
            PixelPoint::new(899.0, 899.0),
        ] {
            let back = cal.lonlat_to_xy(cal.xy_to_lonlat(p));
            assert_relative_eq!(back.x, p.x, epsilon = 1e-9, max_relative = 1e-6);
            assert_relative_eq!(back.y, p.y, epsilon = 1e-9, max_relative = 1e-6);
        }
        let g = GeoPoint::new(-1.3, 52.9);
        let back = cal.xy_to_lonlat(cal.lonlat_to_xy(g));
        assert_relative_eq!(back.lon, g.lon, max_relative = 1e-9);
        assert_relative_eq!(back.lat, g.lat, max_relative = 1e-9);
    }

    #[test]
    fn singular_affine_is_rejected() {
        let err = CalibrationResult::new(
            Affine2::from_rows([[1.0, 2.0, 0.0], [2.0, 4.0, 0.0]]),
            PixelBoundingBox::new(0, 0, 10, 10),
            GeoBoundingBox::new(0.0, 0.0, 1.0, 1.0),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::SingularFit {
                stage: FitStage::Inverse,
                ..
            }
        ));
    }

    #[test]
    fn serializes_as_flat_record() {
        let cal = sample();
        let json = serde_json::to_value(cal).expect("json");
        assert_eq!(json["affine"][1][2], 4300.0);
        assert_eq!(json["pixel_bbox"], serde_json::json!([226, 216, 866, 676]));
        assert_eq!(json["bounds_geo"][3], 58.0);
        assert_eq!(json["inverse"].as_array().map(Vec::len), Some(2));

        let back: CalibrationResult = serde_json::from_value(json).expect("parse");
        assert_eq!(back, cal);
    }

    #[test]
    fn singular_record_is_rejected_on_load() {
        let raw = r#"{
            "affine": [[0, 0, 0], [0, 0, 0]],
            "inverse": [[1, 0, 0], [0, 1, 0]],
            "pixel_bbox": [0, 0, 10, 10],
            "bounds_geo": [0.0, 0.0, 1.0, 1.0]
        }"#;
        let err = serde_json::from_str::<CalibrationResult>(raw).unwrap_err();
        assert!(err.to_string().contains("singular"), "{err}");
    }

    #[test]
    fn inconsistent_inverse_is_rejected_on_load() {
        let mut record = CalibrationRecord::from(sample());
        record.inverse[0][2] += 0.5;
        let err = CalibrationResult::try_from(record.clone()).unwrap_err();
        assert!(matches!(err, CalibrationError::InverseMismatch { .. }));

        let json = serde_json::to_string(&record).expect("json");
        assert!(serde_json::from_str::<CalibrationResult>(&json).is_err());

        // Rounding far below the tolerance is accepted.
        let mut record = CalibrationRecord::from(sample());
        record.inverse[1][1] *= 1.0 + 1e-12;
        assert!(CalibrationResult::try_from(record).is_ok());
    }

    #[test]
    fn pixel_bbox_bounds_cover_the_box() {
        let cal = sample();
        let geo = cal.pixel_bbox_geo_bounds();
        assert!(geo.lon_min < geo.lon_max);
        assert!(geo.lat_min < geo.lat_max);
        for (x, y) in [(226.0, 216.0), (866.0, 676.0)] {
            let g = cal.xy_to_lonlat(PixelPoint::new(x, y));
            assert!(g.lon >= geo.lon_min - 1e-9 && g.lon <= geo.lon_max + 1e-9);
            assert!(g.lat >= geo.lat_min - 1e-9 && g.lat <= geo.lat_max + 1e-9);
        }
    }
}
