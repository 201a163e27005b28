//! Monte Carlo propagation of control-point uncertainty.
//!
//! Each iteration perturbs every control point's target coordinates with
//! independent normal noise (`target_x` then `target_y`, in control-point
//! order), refits the affine transform and applies it to all unprojected
//! points. Source coordinates are never perturbed.

use nalgebra::Point2;

use crate::affine::AffineEstimator;
use crate::{
    ControlPointSet, DrawSource, Ensemble, FitError, Realization, RealizationSink,
    UnprojectedPoint,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Per-point target means and standard errors, validated once per run.
struct Perturbation {
    means: Vec<Point2<f64>>,
    stderrs: Vec<(f64, f64)>,
}

impl Perturbation {
    fn new(control_points: &ControlPointSet) -> Result<Self, FitError> {
        let stderrs = control_points
            .iter()
            .map(|p| p.stderr())
            .collect::<Option<Vec<_>>>()
            .ok_or(FitError::NoUncertaintyData)?;
        let means = control_points
            .iter()
            .map(|p| Point2::new(p.target_x, p.target_y))
            .collect();
        Ok(Self { means, stderrs })
    }

    fn draw_into(&self, source: &mut DrawSource, out: &mut Vec<Point2<f64>>) {
        out.clear();
        for (m, &(sx, sy)) in self.means.iter().zip(&self.stderrs) {
            let x = source.normal(m.x, sx);
            let y = source.normal(m.y, sy);
            out.push(Point2::new(x, y));
        }
    }
}

fn realize(
    estimator: &AffineEstimator,
    targets: &[Point2<f64>],
    unprojected: &[UnprojectedPoint],
    iteration: usize,
    out: &mut Vec<Realization>,
) -> Result<(), FitError> {
    let transform = estimator.solve(targets)?;
    if !transform.is_finite() {
        return Err(FitError::Singular {
            iteration: Some(iteration),
        });
    }
    out.clear();
    out.extend(
        unprojected
            .iter()
            .map(|p| Realization::from_projected(iteration, transform.project(p))),
    );
    Ok(())
}

fn estimator_for(control_points: &ControlPointSet) -> Result<AffineEstimator, FitError> {
    // Sources are shared by every iteration, so a degenerate design fails on
    // the first one.
    AffineEstimator::new(control_points).map_err(|e| e.at_iteration(0))
}

/// Run `n_sims` iterations and collect the ensemble.
///
/// The result holds `n_sims * unprojected.len()` rows, grouped by iteration
/// and, within an iteration, in input order. Requires every control point to
/// carry standard errors ([`FitError::NoUncertaintyData`] otherwise).
pub fn simulate(
    control_points: &ControlPointSet,
    unprojected: &[UnprojectedPoint],
    n_sims: usize,
    source: &mut DrawSource,
) -> Result<Vec<Realization>, FitError> {
    let mut ensemble = Ensemble::with_capacity(n_sims, unprojected.len());
    simulate_into(control_points, unprojected, n_sims, source, &mut ensemble)?;
    Ok(ensemble.into_vec())
}

/// Streaming form of [`simulate`]: each iteration is handed to `sink` as
/// soon as it is computed.
#[cfg_attr(
    feature = "tracing",
    instrument(
        level = "info",
        skip(control_points, unprojected, source, sink),
        fields(n_control = control_points.len(), n_points = unprojected.len())
    )
)]
pub fn simulate_into<S: RealizationSink>(
    control_points: &ControlPointSet,
    unprojected: &[UnprojectedPoint],
    n_sims: usize,
    source: &mut DrawSource,
    mut sink: S,
) -> Result<(), S::Error> {
    let perturbation = Perturbation::new(control_points)?;
    if n_sims == 0 {
        return Ok(());
    }
    let estimator = estimator_for(control_points)?;

    let mut targets = Vec::with_capacity(control_points.len());
    let mut rows = Vec::with_capacity(unprojected.len());
    for i in 0..n_sims {
        log::debug!("simulation {}/{}", i + 1, n_sims);
        perturbation.draw_into(source, &mut targets);
        realize(&estimator, &targets, unprojected, i, &mut rows)?;
        sink.accept(i, &rows)?;
    }
    Ok(())
}

/// Parallel variant of [`simulate`].
///
/// Iteration `i` draws from its own generator,
/// [`DrawSource::for_iteration`]`(base_seed, i)`, so the ensemble is
/// reproducible for a given seed and independent of thread scheduling. It is
/// not the same stream as the sequential [`simulate`] with the same seed.
#[cfg(feature = "rayon")]
pub fn simulate_parallel(
    control_points: &ControlPointSet,
    unprojected: &[UnprojectedPoint],
    n_sims: usize,
    base_seed: u64,
) -> Result<Vec<Realization>, FitError> {
    use rayon::prelude::*;

    let perturbation = Perturbation::new(control_points)?;
    if n_sims == 0 {
        return Ok(Vec::new());
    }
    let estimator = estimator_for(control_points)?;

    let per_iteration: Vec<Vec<Realization>> = (0..n_sims)
        .into_par_iter()
        .map(|i| -> Result<Vec<Realization>, FitError> {
            let mut source = DrawSource::for_iteration(base_seed, i);
            let mut targets = Vec::with_capacity(perturbation.means.len());
            let mut rows = Vec::with_capacity(unprojected.len());
            perturbation.draw_into(&mut source, &mut targets);
            realize(&estimator, &targets, unprojected, i, &mut rows)?;
            Ok(rows)
        })
        .collect::<Result<_, FitError>>()?;

    Ok(per_iteration.into_iter().flatten().collect())
}
