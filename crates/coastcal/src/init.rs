use crate::{CalibrationError, FitStage, LatitudeAxis};
use coastcal_core::{Affine2, GeoBoundingBox, PixelBoundingBox};

/// Axis-aligned seed transform mapping the corners of `geo` onto the
/// corners of `px`.
///
/// Longitude and latitude get independent scales; there is no shear or
/// rotation. With [`LatitudeAxis::NorthUp`] the northern edge of `geo` lands
/// on the top edge of `px`.
pub fn initial_affine(
    geo: &GeoBoundingBox,
    px: &PixelBoundingBox,
    axis: LatitudeAxis,
) -> Result<Affine2, CalibrationError> {
    let lon_span = geo.width();
    let lat_span = geo.height();
    if !(lon_span.is_finite() && lon_span > 0.0 && lat_span.is_finite() && lat_span > 0.0) {
        return Err(CalibrationError::singular(FitStage::Initial));
    }
    if !px.is_valid() {
        return Err(CalibrationError::InvalidPixelBbox(*px));
    }

    let left = px.left as f64;
    let top = px.top as f64;
    let sx = px.width() as f64 / lon_span;
    let tx = left - sx * geo.lon_min;

    let (sy, ty) = match axis {
        LatitudeAxis::NorthUp => {
            let sy = -(px.height() as f64) / lat_span;
            (sy, top - sy * geo.lat_max)
        }
        LatitudeAxis::SouthUp => {
            let sy = px.height() as f64 / lat_span;
            (sy, top - sy * geo.lat_min)
        }
    };

    Ok(Affine2::from_rows([[sx, 0.0, tx], [0.0, sy, ty]]))
}
