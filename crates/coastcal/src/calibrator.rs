use crate::feature::{extract_feature, FeatureCloud};
use crate::icp::{refine_affine, IcpOutcome, PixelIndex};
use crate::init::initial_affine;
use crate::{CalibrationError, CalibrationParams, CalibrationResult};
use coastcal_core::{GeoBoundingBox, GeoPoint, GrayImageView, PixelBoundingBox};
use log::{debug, info};

/// Smallest coastline that can pin down the six affine parameters.
pub const MIN_COASTLINE_POINTS: usize = 3;

/// Calibration result plus the diagnostics gathered on the way.
#[derive(Clone, Debug)]
pub struct Calibration {
    pub result: CalibrationResult,
    pub icp: IcpOutcome,
    /// Foreground pixels found before any subsampling.
    pub feature_pixels: usize,
    /// Luma cut used for the foreground test.
    pub threshold_cut: u8,
}

/// Coastline-to-raster calibrator.
///
/// Holds only configuration; every call runs the full pipeline on its own
/// data.
#[derive(Clone, Debug, Default)]
pub struct CoastlineCalibrator {
    params: CalibrationParams,
}

impl CoastlineCalibrator {
    pub fn new(params: CalibrationParams) -> Self {
        Self { params }
    }

    #[inline]
    pub fn params(&self) -> &CalibrationParams {
        &self.params
    }

    /// Calibrate `coastline` against a grayscale raster.
    pub fn calibrate(
        &self,
        image: &GrayImageView<'_>,
        coastline: &[GeoPoint],
        pixel_bbox: Option<PixelBoundingBox>,
    ) -> Result<CalibrationResult, CalibrationError> {
        self.calibrate_detailed(image, coastline, pixel_bbox)
            .map(|c| c.result)
    }

    /// Like [`calibrate`](Self::calibrate), also returning ICP diagnostics.
    pub fn calibrate_detailed(
        &self,
        image: &GrayImageView<'_>,
        coastline: &[GeoPoint],
        pixel_bbox: Option<PixelBoundingBox>,
    ) -> Result<Calibration, CalibrationError> {
        let bounds_geo = validate_coastline(coastline)?;

        let FeatureCloud {
            points,
            bbox: feature_bbox,
            cut,
            foreground,
        } = extract_feature(image, pixel_bbox, &self.params.feature)?;
        let working_bbox = pixel_bbox.unwrap_or(feature_bbox);

        let seed = initial_affine(&bounds_geo, &working_bbox, self.params.init.latitude_axis)?;
        debug!("initial affine {:?}", seed.to_rows());

        let index = PixelIndex::new(&points);
        let icp = refine_affine(coastline, &index, seed, &self.params.icp)?;
        let result = CalibrationResult::new(icp.affine, working_bbox, bounds_geo)?;

        info!(
            "calibrated {} coastline points against {} feature pixels: rms={:.3}px iterations={} converged={}",
            coastline.len(),
            foreground,
            icp.rms(),
            icp.iterations,
            icp.converged
        );

        Ok(Calibration {
            result,
            icp,
            feature_pixels: foreground,
            threshold_cut: cut,
        })
    }
}

fn validate_coastline(coastline: &[GeoPoint]) -> Result<GeoBoundingBox, CalibrationError> {
    if coastline.len() < MIN_COASTLINE_POINTS {
        return Err(CalibrationError::EmptyCoastline {
            got: coastline.len(),
            min: MIN_COASTLINE_POINTS,
        });
    }
    if let Some(index) = coastline.iter().position(|g| !g.is_finite()) {
        return Err(CalibrationError::NonFiniteCoastline { index });
    }
    GeoBoundingBox::enclosing(coastline).ok_or(CalibrationError::EmptyCoastline {
        got: 0,
        min: MIN_COASTLINE_POINTS,
    })
}
