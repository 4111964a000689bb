//! End-to-end entry points.

use crate::{CalibrationError, CalibrationParams, CalibrationResult, CoastlineCalibrator};
use coastcal_core::{GeoPoint, GrayImageView, PixelBoundingBox};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Calibrate `coastline` against a borrowed grayscale raster.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(image, coastline, params),
        fields(width = image.width, height = image.height, vertices = coastline.len())
    )
)]
pub fn calibrate(
    image: &GrayImageView<'_>,
    coastline: &[GeoPoint],
    pixel_bbox: Option<PixelBoundingBox>,
    params: &CalibrationParams,
) -> Result<CalibrationResult, CalibrationError> {
    CoastlineCalibrator::new(params.clone()).calibrate(image, coastline, pixel_bbox)
}

/// Calibrate against a raw row-major 8-bit grayscale buffer.
pub fn calibrate_gray_u8(
    width: usize,
    height: usize,
    pixels: &[u8],
    coastline: &[GeoPoint],
    pixel_bbox: Option<PixelBoundingBox>,
    params: &CalibrationParams,
) -> Result<CalibrationResult, CalibrationError> {
    let view =
        GrayImageView::new(width, height, pixels).ok_or(CalibrationError::InvalidGrayBuffer {
            width,
            height,
            got: pixels.len(),
        })?;
    calibrate(&view, coastline, pixel_bbox, params)
}

/// Borrow an `image::GrayImage` as a core view.
#[cfg(feature = "image")]
pub fn gray_view(img: &::image::GrayImage) -> GrayImageView<'_> {
    GrayImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

/// Calibrate against a decoded image of any color type; it is converted to
/// luma first.
#[cfg(feature = "image")]
pub fn calibrate_image(
    image: &::image::DynamicImage,
    coastline: &[GeoPoint],
    pixel_bbox: Option<PixelBoundingBox>,
    params: &CalibrationParams,
) -> Result<CalibrationResult, CalibrationError> {
    let gray = image.to_luma8();
    calibrate(&gray_view(&gray), coastline, pixel_bbox, params)
}

/// Decode the image at `path` and calibrate against it.
#[cfg(feature = "image")]
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(path, coastline, params), fields(path = %path.as_ref().display()))
)]
pub fn calibrate_path(
    path: impl AsRef<std::path::Path>,
    coastline: &[GeoPoint],
    pixel_bbox: Option<PixelBoundingBox>,
    params: &CalibrationParams,
) -> Result<CalibrationResult, CalibrationError> {
    let image = ::image::open(path.as_ref())?;
    calibrate_image(&image, coastline, pixel_bbox, params)
}
