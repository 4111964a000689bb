use nalgebra::{Matrix2, Matrix2x3, Matrix3, Point2, Vector3};
use serde::{Deserialize, Serialize};

/// Relative determinant floor for the 2x2 linear part.
const DET_EPS: f64 = 1e-12;
/// Absolute floor for the largest linear coefficient.
const MIN_SCALE: f64 = 1e-12;
/// Reciprocal condition number floor for the normal equations.
const RCOND_MIN: f64 = 1e-10;

/// Errors returned by [`Affine2::fit_weighted`].
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AffineFitError {
    #[error("correspondence length mismatch (src={src}, dst={dst})")]
    LengthMismatch { src: usize, dst: usize },
    #[error("weight length mismatch (points={points}, weights={weights})")]
    WeightMismatch { points: usize, weights: usize },
    #[error("need at least 3 weighted correspondences, got {got}")]
    TooFewPoints { got: usize },
    #[error("correspondence set is ill-conditioned (rcond={rcond:.3e})")]
    IllConditioned { rcond: f64 },
    #[error("fitted affine has a singular linear part")]
    Singular,
}

/// 2D affine map `[u, v]^T = A * [x, y, 1]^T`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Affine2 {
    pub m: Matrix2x3<f64>,
}

impl Affine2 {
    pub fn new(m: Matrix2x3<f64>) -> Self {
        Self { m }
    }

    pub fn from_rows(rows: [[f64; 3]; 2]) -> Self {
        Self::new(Matrix2x3::new(
            rows[0][0], rows[0][1], rows[0][2], //
            rows[1][0], rows[1][1], rows[1][2],
        ))
    }

    pub fn to_rows(&self) -> [[f64; 3]; 2] {
        [
            [self.m[(0, 0)], self.m[(0, 1)], self.m[(0, 2)]],
            [self.m[(1, 0)], self.m[(1, 1)], self.m[(1, 2)]],
        ]
    }

    pub fn identity() -> Self {
        Self::from_rows([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]])
    }

    #[inline]
    pub fn apply(&self, p: Point2<f64>) -> Point2<f64> {
        let v = self.m * Vector3::new(p.x, p.y, 1.0);
        Point2::new(v[0], v[1])
    }

    /// Top-left 2x2 block.
    #[inline]
    pub fn linear(&self) -> Matrix2<f64> {
        self.m.fixed_view::<2, 2>(0, 0).into_owned()
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.linear().determinant()
    }

    /// Homogeneous 3x3 lift with `[0, 0, 1]` as the last row.
    pub fn to_homogeneous(&self) -> Matrix3<f64> {
        let m = &self.m;
        Matrix3::new(
            m[(0, 0)], m[(0, 1)], m[(0, 2)], //
            m[(1, 0)], m[(1, 1)], m[(1, 2)], //
            0.0, 0.0, 1.0,
        )
    }

    /// `true` when the determinant is bounded away from zero relative to
    /// the magnitude of the linear part.
    pub fn is_invertible(&self) -> bool {
        let lin = self.linear();
        let scale = lin.amax();
        let det = lin.determinant();
        if !det.is_finite() || !(scale > MIN_SCALE) {
            return false;
        }
        det.abs() > DET_EPS * scale * scale
    }

    pub fn inverse(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        let inv = self.to_homogeneous().try_inverse()?;
        Some(Self::new(inv.fixed_view::<2, 3>(0, 0).into_owned()))
    }

    /// Unweighted least-squares fit of `dst ~ A * src`.
    pub fn fit(src: &[Point2<f64>], dst: &[Point2<f64>]) -> Result<Self, AffineFitError> {
        Self::fit_weighted(src, dst, None)
    }

    /// Weighted least-squares fit of `dst ~ A * src`.
    ///
    /// Source points are Hartley-normalized before the 3x3 normal equations
    /// are formed; the solution is mapped back afterwards. Correspondences with
    /// a non-positive weight are ignored.
    pub fn fit_weighted(
        src: &[Point2<f64>],
        dst: &[Point2<f64>],
        weights: Option<&[f64]>,
    ) -> Result<Self, AffineFitError> {
        if src.len() != dst.len() {
            return Err(AffineFitError::LengthMismatch {
                src: src.len(),
                dst: dst.len(),
            });
        }
        if let Some(w) = weights {
            if w.len() != src.len() {
                return Err(AffineFitError::WeightMismatch {
                    points: src.len(),
                    weights: w.len(),
                });
            }
        }
        let weight_at = |i: usize| weights.map_or(1.0, |w| w[i]);

        let mut active = 0usize;
        let mut w_sum = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for (i, p) in src.iter().enumerate() {
            let w = weight_at(i);
            if w > 0.0 {
                active += 1;
                w_sum += w;
                cx += w * p.x;
                cy += w * p.y;
            }
        }
        if active < 3 {
            return Err(AffineFitError::TooFewPoints { got: active });
        }
        cx /= w_sum;
        cy /= w_sum;

        let mut mean_dist = 0.0;
        for (i, p) in src.iter().enumerate() {
            let w = weight_at(i);
            if w > 0.0 {
                mean_dist += w * ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt();
            }
        }
        mean_dist /= w_sum;
        let t = hartley_normalization(cx, cy, mean_dist);

        let mut normal = Matrix3::<f64>::zeros();
        let mut bx = Vector3::<f64>::zeros();
        let mut by = Vector3::<f64>::zeros();
        for (i, (s, d)) in src.iter().zip(dst).enumerate() {
            let w = weight_at(i);
            if w <= 0.0 {
                continue;
            }
            let q = t * Vector3::new(s.x, s.y, 1.0);
            normal += w * q * q.transpose();
            bx += (w * d.x) * q;
            by += (w * d.y) * q;
        }

        let sv = normal.singular_values();
        let sv_max = sv.max();
        let rcond = if sv_max > 0.0 { sv.min() / sv_max } else { 0.0 };
        if !(rcond > RCOND_MIN) {
            return Err(AffineFitError::IllConditioned { rcond });
        }
        let chol = normal
            .cholesky()
            .ok_or(AffineFitError::IllConditioned { rcond })?;
        let px = chol.solve(&bx);
        let py = chol.solve(&by);

        let normalized = Matrix2x3::new(
            px[0], px[1], px[2], //
            py[0], py[1], py[2],
        );
        let fitted = Self::new(normalized * t);
        if !fitted.is_invertible() {
            return Err(AffineFitError::Singular);
        }
        Ok(fitted)
    }

    /// Weighted mean of `|A * src - dst|^2`; `NaN` when no weight is positive.
    pub fn mean_squared_error(
        &self,
        src: &[Point2<f64>],
        dst: &[Point2<f64>],
        weights: Option<&[f64]>,
    ) -> f64 {
        let mut acc = 0.0;
        let mut w_sum = 0.0;
        for (i, (s, d)) in src.iter().zip(dst).enumerate() {
            let w = weights.map_or(1.0, |w| w[i]);
            if w <= 0.0 {
                continue;
            }
            acc += w * (self.apply(*s) - d).norm_squared();
            w_sum += w;
        }
        acc / w_sum
    }
}

fn hartley_normalization(cx: f64, cy: f64, mean_dist: f64) -> Matrix3<f64> {
    let s = if mean_dist > 1e-12 {
        (2.0_f64).sqrt() / mean_dist
    } else {
        1.0
    };

    Matrix3::<f64>::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}
