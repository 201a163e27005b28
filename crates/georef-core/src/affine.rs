//! Least-squares affine estimation from control points.
//!
//! The model is
//!
//! ```text
//! x' = a*x + b*y + c
//! y' = d*x + e*y + f
//! ```
//!
//! Both rows are independent 3-parameter least-squares problems sharing the
//! design matrix `[source_x, source_y, 1]`. The normal equations are formed
//! on centred and scaled source coordinates (Hartley-style) and solved with a
//! Cholesky factorization, which is reused for every right-hand side.

use nalgebra::{Cholesky, Matrix3, Point2, SymmetricEigen, Vector3, U3};
use serde::{Deserialize, Serialize};

use crate::{ControlPointSet, FitError, ProjectedPoint, UnprojectedPoint};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Smallest accepted ratio between the extreme eigenvalues of the normalized
/// normal matrix. Below this the control points are treated as collinear.
const MIN_EIGEN_RATIO: f64 = 1e-12;

/// Coefficients of a 2D affine map.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl AffineTransform {
    pub const IDENTITY: AffineTransform = AffineTransform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// Map `(x, y)` to `(x', y')`. Non-finite inputs propagate.
    #[inline]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    #[inline]
    pub fn apply_point(&self, p: Point2<f64>) -> Point2<f64> {
        let (x, y) = self.apply(p.x, p.y);
        Point2::new(x, y)
    }

    /// Transform every point, preserving input order.
    pub fn apply_points(&self, points: &[UnprojectedPoint]) -> Vec<ProjectedPoint> {
        points.iter().map(|p| self.project(p)).collect()
    }

    #[inline]
    pub fn project(&self, p: &UnprojectedPoint) -> ProjectedPoint {
        let (x_pred, y_pred) = self.apply(p.x, p.y);
        ProjectedPoint {
            uid: p.uid,
            x: p.x,
            y: p.y,
            x_pred,
            y_pred,
        }
    }

    /// Homogeneous 3x3 form `[[a, b, c], [d, e, f], [0, 0, 1]]`.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.a, self.b, self.c, //
            self.d, self.e, self.f, //
            0.0, 0.0, 1.0,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse map, if the linear part is invertible.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        Some(Self {
            a: self.e / det,
            b: -self.b / det,
            c: (self.b * self.f - self.e * self.c) / det,
            d: -self.d / det,
            e: self.a / det,
            f: (self.d * self.c - self.a * self.f) / det,
        })
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// A fitted transform together with its residuals on the control points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AffineFit {
    pub transform: AffineTransform,
    /// `predicted - observed` target coordinates, one per control point.
    pub residuals: Vec<[f64; 2]>,
    /// Root-mean-square residual distance.
    pub rms: f64,
}

/// Factorized design for a fixed set of source coordinates.
///
/// Since only the target side changes between fits that share control-point
/// sources, the factorization can be built once and reused by
/// [`AffineEstimator::solve`].
#[derive(Clone, Debug)]
pub struct AffineEstimator {
    /// Normalized `(u, v)` source coordinates.
    uv: Vec<Point2<f64>>,
    cx: f64,
    cy: f64,
    scale: f64,
    chol: Cholesky<f64, U3>,
}

impl AffineEstimator {
    /// Build the estimator from the source coordinates of `control_points`.
    pub fn new(control_points: &ControlPointSet) -> Result<Self, FitError> {
        let sources: Vec<Point2<f64>> = control_points
            .iter()
            .map(|p| Point2::new(p.source_x, p.source_y))
            .collect();
        Self::from_sources(&sources)
    }

    pub(crate) fn from_sources(sources: &[Point2<f64>]) -> Result<Self, FitError> {
        if sources.len() < 3 {
            return Err(FitError::Singular { iteration: None });
        }

        let n = sources.len() as f64;
        let (sx, sy) = sources
            .iter()
            .fold((0.0, 0.0), |(ax, ay), p| (ax + p.x, ay + p.y));
        let (cx, cy) = (sx / n, sy / n);
        let mean_dist = sources
            .iter()
            .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
            .sum::<f64>()
            / n;
        let scale = if mean_dist > 1e-12 {
            std::f64::consts::SQRT_2 / mean_dist
        } else {
            1.0
        };

        let uv: Vec<Point2<f64>> = sources
            .iter()
            .map(|p| Point2::new(scale * (p.x - cx), scale * (p.y - cy)))
            .collect();

        let mut xtx = Matrix3::<f64>::zeros();
        for p in &uv {
            let row = Vector3::new(p.x, p.y, 1.0);
            xtx += row * row.transpose();
        }

        let eig = SymmetricEigen::new(xtx);
        let max = eig.eigenvalues.max();
        let min = eig.eigenvalues.min();
        if !(max > 0.0 && min > max * MIN_EIGEN_RATIO) {
            return Err(FitError::Singular { iteration: None });
        }

        let chol = xtx.cholesky().ok_or(FitError::Singular { iteration: None })?;

        Ok(Self {
            uv,
            cx,
            cy,
            scale,
            chol,
        })
    }

    pub fn num_points(&self) -> usize {
        self.uv.len()
    }

    /// Solve for the transform mapping the factorized sources onto `targets`.
    ///
    /// `targets` must be given in the same order as the sources. The result
    /// contains non-finite coefficients if any target is non-finite.
    pub fn solve(&self, targets: &[Point2<f64>]) -> Result<AffineTransform, FitError> {
        if targets.len() != self.uv.len() {
            return Err(FitError::TargetCountMismatch {
                expected: self.uv.len(),
                got: targets.len(),
            });
        }
        let (a, b, c) = self.solve_axis(targets.iter().map(|t| t.x));
        let (d, e, f) = self.solve_axis(targets.iter().map(|t| t.y));
        Ok(AffineTransform { a, b, c, d, e, f })
    }

    fn solve_axis(&self, values: impl Iterator<Item = f64> + Clone) -> (f64, f64, f64) {
        let n = self.uv.len() as f64;
        let mean = values.clone().sum::<f64>() / n;

        let mut rhs = Vector3::<f64>::zeros();
        for (p, t) in self.uv.iter().zip(values) {
            rhs += Vector3::new(p.x, p.y, 1.0) * (t - mean);
        }
        let sol = self.chol.solve(&rhs);

        // Undo the normalization: u = s*(x - cx), v = s*(y - cy).
        let a = sol[0] * self.scale;
        let b = sol[1] * self.scale;
        let c = sol[2] + mean - a * self.cx - b * self.cy;
        (a, b, c)
    }
}

/// Fit the affine transform mapping source to target coordinates by ordinary
/// least squares.
///
/// Fails with [`FitError::Singular`] when the source coordinates are
/// collinear or coincide.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "debug", skip(control_points), fields(n = control_points.len()))
)]
pub fn fit(control_points: &ControlPointSet) -> Result<AffineTransform, FitError> {
    let estimator = AffineEstimator::new(control_points)?;
    let transform = estimator.solve(&targets_of(control_points))?;
    log::debug!(
        "affine fit on {} points: a={:.9} b={:.9} c={:.6} d={:.9} e={:.9} f={:.6}",
        control_points.len(),
        transform.a,
        transform.b,
        transform.c,
        transform.d,
        transform.e,
        transform.f
    );
    Ok(transform)
}

/// Like [`fit`], also reporting per-point residuals and their RMS.
pub fn fit_with_residuals(control_points: &ControlPointSet) -> Result<AffineFit, FitError> {
    let transform = fit(control_points)?;
    let residuals: Vec<[f64; 2]> = control_points
        .iter()
        .map(|p| {
            let (x, y) = transform.apply(p.source_x, p.source_y);
            [x - p.target_x, y - p.target_y]
        })
        .collect();
    let rms = (residuals
        .iter()
        .map(|[dx, dy]| dx * dx + dy * dy)
        .sum::<f64>()
        / residuals.len() as f64)
        .sqrt();
    Ok(AffineFit {
        transform,
        residuals,
        rms,
    })
}

pub(crate) fn targets_of(control_points: &ControlPointSet) -> Vec<Point2<f64>> {
    control_points
        .iter()
        .map(|p| Point2::new(p.target_x, p.target_y))
        .collect()
}
