use coastcal_core::{AffineFitError, PixelBoundingBox};
use std::fmt;

/// Pipeline stage at which a fit became singular.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitStage {
    /// Bounding-box seed transform.
    Initial,
    /// Least-squares solve of ICP iteration `n` (1-based).
    Icp(usize),
    /// Inversion of the final transform.
    Inverse,
}

impl fmt::Display for FitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStage::Initial => write!(f, "initial estimate"),
            FitStage::Icp(n) => write!(f, "ICP iteration {n}"),
            FitStage::Inverse => write!(f, "inverse"),
        }
    }
}

/// Errors returned by the calibration pipeline.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[cfg(feature = "image")]
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    #[error("no foreground pixels below the intensity threshold")]
    EmptyFeature,

    #[error("singular affine fit at {stage}")]
    SingularFit {
        stage: FitStage,
        #[source]
        source: Option<AffineFitError>,
    },

    #[error("coastline has {got} points, need at least {min}")]
    EmptyCoastline { got: usize, min: usize },

    #[error("coastline contains a non-finite coordinate at index {index}")]
    NonFiniteCoastline { index: usize },

    #[error("stored inverse deviates from the inverse of the affine by {deviation:.3e}")]
    InverseMismatch { deviation: f64 },

    #[error("invalid pixel bounding box {0:?}")]
    InvalidPixelBbox(PixelBoundingBox),

    #[error("invalid grayscale buffer (width={width}, height={height}, got {got} bytes)")]
    InvalidGrayBuffer {
        width: usize,
        height: usize,
        got: usize,
    },
}

impl CalibrationError {
    pub(crate) fn singular(stage: FitStage) -> Self {
        Self::SingularFit {
            stage,
            source: None,
        }
    }

    pub(crate) fn singular_from(stage: FitStage, source: AffineFitError) -> Self {
        Self::SingularFit {
            stage,
            source: Some(source),
        }
    }
}
