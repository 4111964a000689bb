use serde::{Deserialize, Serialize};

/// Foreground classification rule for the feature extractor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    /// Pixels with luma strictly below the value are foreground.
    Fixed(u8),
    /// Otsu split of the examined region; the dark class is foreground.
    Otsu,
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Fixed(128)
    }
}

/// Feature extraction parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureParams {
    pub threshold: Threshold,
    /// Upper bound on the number of feature points handed to ICP.
    ///
    /// When exceeded, a uniformly strided subset of the row-major point list
    /// is kept. `None` keeps every foreground pixel.
    pub max_points: Option<usize>,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            max_points: None,
        }
    }
}

/// Orientation of latitude relative to image rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatitudeAxis {
    /// Increasing latitude moves up the image (decreasing `y`).
    #[default]
    NorthUp,
    /// Increasing latitude moves down the image.
    SouthUp,
}

/// Initial transform parameters.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitParams {
    pub latitude_axis: LatitudeAxis,
}

/// Correspondence rejection policy applied before each ICP fit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierRejection {
    /// Every correspondence takes part in the fit.
    #[default]
    None,
    /// Drop correspondences whose distance exceeds `k` times the median
    /// correspondence distance.
    MedianMultiple(f64),
}

/// ICP refinement parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcpParams {
    /// Hard cap on iterations; values below 1 are treated as 1.
    pub max_iterations: usize,
    /// Stop once the mean squared residual changes by less than this.
    pub tolerance: f64,
    pub outlier_rejection: OutlierRejection,
}

impl Default for IcpParams {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            tolerance: 1e-6,
            outlier_rejection: OutlierRejection::None,
        }
    }
}

/// Full calibration configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationParams {
    pub feature: FeatureParams,
    pub init: InitParams,
    pub icp: IcpParams,
}
