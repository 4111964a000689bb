//! Affine iterative closest point.
//!
//! Each iteration projects the geographic polyline through the current
//! transform, pairs every projected vertex with its nearest feature pixel and
//! refits the affine by weighted least squares. The loop stops when the mean
//! squared residual settles or the iteration cap is hit.

use crate::{CalibrationError, FitStage, IcpParams, OutlierRejection};
use coastcal_core::{Affine2, GeoPoint, PixelPoint};
use kiddo::{KdTree, SquaredEuclidean};
use log::{debug, trace};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Frame rotation applied to points stored in the k-d tree, in radians.
///
/// Raster points share coordinates along whole rows and columns, and a k-d
/// tree bucket cannot be split when all of its points share the value on the
/// split axis. No two distinct grid points share a coordinate in this rotated
/// frame. Distances do not depend on the rotation.
const INDEX_ROTATION: f64 = 0.5;

/// Nearest-neighbour index over a pixel point cloud.
pub struct PixelIndex {
    tree: KdTree<f64, 2>,
    points: Vec<PixelPoint>,
    cos: f64,
    sin: f64,
}

impl PixelIndex {
    pub fn new(points: &[PixelPoint]) -> Self {
        let (sin, cos) = INDEX_ROTATION.sin_cos();
        let coords = points
            .iter()
            .map(|p| rotate(cos, sin, p.x, p.y))
            .collect::<Vec<_>>();
        let tree: KdTree<f64, 2> = (&coords).into();
        Self {
            tree,
            points: points.to_vec(),
            cos,
            sin,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closest stored point and its squared distance, `None` when empty.
    pub fn nearest(&self, p: Point2<f64>) -> Option<(PixelPoint, f64)> {
        if self.points.is_empty() {
            return None;
        }
        let query = rotate(self.cos, self.sin, p.x, p.y);
        let nn = self.tree.nearest_one::<SquaredEuclidean>(&query);
        let hit = self.points[nn.item as usize];
        Some((hit, nn.distance))
    }
}

#[inline]
fn rotate(cos: f64, sin: f64, x: f64, y: f64) -> [f64; 2] {
    [cos * x - sin * y, sin * x + cos * y]
}

/// Outcome of an ICP run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct IcpOutcome {
    pub affine: Affine2,
    /// Number of least-squares fits performed.
    pub iterations: usize,
    /// Mean squared residual (px^2) of the final fit over its inliers.
    pub mean_squared_error: f64,
    /// `false` when the iteration cap was reached before the residual settled.
    pub converged: bool,
    /// Correspondences that took part in the final fit.
    pub inliers: usize,
}

impl IcpOutcome {
    pub fn rms(&self) -> f64 {
        self.mean_squared_error.sqrt()
    }
}

/// Refine `initial` so that `coastline` projects onto the feature cloud.
///
/// Fails with [`CalibrationError::SingularFit`] when an iteration's
/// correspondences cannot support a well-conditioned affine.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "debug",
        skip(coastline, index, initial, params),
        fields(vertices = coastline.len(), feature_points = index.len())
    )
)]
pub fn refine_affine(
    coastline: &[GeoPoint],
    index: &PixelIndex,
    initial: Affine2,
    params: &IcpParams,
) -> Result<IcpOutcome, CalibrationError> {
    if index.is_empty() {
        return Err(CalibrationError::EmptyFeature);
    }
    let src: Vec<Point2<f64>> = coastline.iter().map(|g| g.to_point()).collect();
    let max_iterations = params.max_iterations.max(1);

    let mut prev_err = f64::INFINITY;
    let mut matched = Vec::with_capacity(src.len());
    let mut dist2 = Vec::with_capacity(src.len());
    let mut outcome = IcpOutcome {
        affine: initial,
        iterations: 0,
        mean_squared_error: f64::INFINITY,
        converged: false,
        inliers: 0,
    };

    for iteration in 1..=max_iterations {
        matched.clear();
        dist2.clear();
        for s in &src {
            let (hit, d2) = index
                .nearest(outcome.affine.apply(*s))
                .ok_or(CalibrationError::EmptyFeature)?;
            matched.push(hit.to_point());
            dist2.push(d2);
        }

        let weights = rejection_weights(&dist2, params.outlier_rejection);
        let inliers = weights
            .as_ref()
            .map_or(src.len(), |w| w.iter().filter(|&&w| w > 0.0).count());

        let next = Affine2::fit_weighted(&src, &matched, weights.as_deref())
            .map_err(|e| CalibrationError::singular_from(FitStage::Icp(iteration), e))?;
        let err = next.mean_squared_error(&src, &matched, weights.as_deref());

        trace!(
            "icp iteration {}: mse={:.6} inliers={}/{}",
            iteration,
            err,
            inliers,
            src.len()
        );

        outcome = IcpOutcome {
            affine: next,
            iterations: iteration,
            mean_squared_error: err,
            converged: (prev_err - err).abs() < params.tolerance,
            inliers,
        };
        if outcome.converged {
            break;
        }
        prev_err = err;
    }

    if outcome.converged {
        debug!(
            "icp converged after {} iterations (rms={:.3}px)",
            outcome.iterations,
            outcome.rms()
        );
    } else {
        debug!(
            "icp hit the iteration cap {} without converging (rms={:.3}px)",
            max_iterations,
            outcome.rms()
        );
    }
    Ok(outcome)
}

/// Binary weights for the current correspondences, `None` when every
/// correspondence is kept.
fn rejection_weights(dist2: &[f64], policy: OutlierRejection) -> Option<Vec<f64>> {
    let OutlierRejection::MedianMultiple(k) = policy else {
        return None;
    };
    if dist2.is_empty() {
        return None;
    }
    let mut sorted = dist2.to_vec();
    sorted.sort_by(f64::total_cmp);
    let median = sorted[sorted.len() / 2].sqrt();
    let limit = k * median;

    let weights: Vec<f64> = dist2
        .iter()
        .map(|&d2| if d2.sqrt() <= limit { 1.0 } else { 0.0 })
        .collect();
    // Fall back to the full set when rejection leaves too little to fit.
    if weights.iter().filter(|&&w| w > 0.0).count() < 3 {
        return None;
    }
    Some(weights)
}
