//! End-to-end projection run: load, fit, project, simulate, write.

use std::time::Instant;

use crate::core::{
    fit_with_residuals, simulate_into, ControlPointSet, DrawSource, FitError, SpreadAccumulator,
    UnprojectedPoint,
};
use crate::io::{
    load_control_points, load_unprojected, save_projected, save_spread, IoError, RunConfig,
    RunReport, SimWriter,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Errors produced by [`run`].
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Fit(#[from] FitError),
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
}

/// Run the full projection described by `config`.
///
/// Writes `<prefix>-projected.csv` always; when `n_sims` is set also writes
/// `<prefix>-sim.csv` and `<prefix>-spread.csv`. A simulation request against
/// control points without standard errors fails before anything is written.
#[cfg_attr(
    feature = "tracing",
    instrument(level = "info", skip(config), fields(prefix = %config.output_prefix))
)]
pub fn run(config: &RunConfig) -> Result<RunReport, RunError> {
    let started = Instant::now();

    let control = load_control_points(&config.control_points)?;
    let points = load_unprojected(
        &config.unprojected,
        &config.fields,
        &config.missing_values(),
    )?;
    if let Some(n) = config.n_sims {
        if !control.has_uncertainty() {
            return Err(FitError::NoUncertaintyData.into());
        }
        log::info!("will simulate {n} realizations");
    }

    let fit = fit_with_residuals(&control)?;
    log::info!("nominal fit rms = {:.6}", fit.rms);
    let mut report = RunReport::new(
        control.len(),
        control.mode(),
        points.len(),
        &fit,
        config.seed,
    );

    let projected = fit.transform.apply_points(&points);
    let projected_path = config.projected_path();
    save_projected(&projected_path, &projected)?;
    report.add_output(&projected_path);

    if let Some(n_sims) = config.n_sims {
        report.n_sims = Some(n_sims);
        report.parallel = run_simulation(config, &control, &points, n_sims)?;
        report.add_output(config.sim_path());
        report.add_output(config.spread_path());
    }

    report.elapsed_s = started.elapsed().as_secs_f64();
    if let Some(path) = &config.report {
        report.write_json(path)?;
        log::info!("wrote run report to {}", path.display());
    }
    log::info!("projected data in {:.3} seconds", report.elapsed_s);
    Ok(report)
}

/// Returns whether the parallel path was taken.
fn run_simulation(
    config: &RunConfig,
    control: &ControlPointSet,
    points: &[UnprojectedPoint],
    n_sims: usize,
) -> Result<bool, RunError> {
    let mut writer = SimWriter::create(config.sim_path())?;
    let mut spread = SpreadAccumulator::new();

    let parallel = config.parallel && cfg!(feature = "rayon");
    if config.parallel && !parallel {
        log::warn!("parallel simulation requested but the `rayon` feature is disabled");
    }

    if parallel {
        #[cfg(feature = "rayon")]
        simulate_parallel_into(control, points, n_sims, config.seed, (&mut writer, &mut spread))?;
    } else {
        let mut source = DrawSource::new(config.seed);
        simulate_into(
            control,
            points,
            n_sims,
            &mut source,
            (&mut writer, &mut spread),
        )?;
    }

    let rows = writer.rows_written();
    writer.finish()?;
    log::info!("wrote {} simulated rows to {}", rows, config.sim_path().display());
    save_spread(config.spread_path(), &spread.finish())?;
    Ok(parallel)
}

/// Runs iterations on the rayon pool, then replays them into `sink` in order.
#[cfg(feature = "rayon")]
fn simulate_parallel_into<S: crate::core::RealizationSink>(
    control: &ControlPointSet,
    points: &[UnprojectedPoint],
    n_sims: usize,
    seed: u64,
    mut sink: S,
) -> Result<(), S::Error> {
    let rows = crate::core::simulate_parallel(control, points, n_sims, seed)?;
    let per_iteration = points.len().max(1);
    for (i, chunk) in rows.chunks(per_iteration).enumerate() {
        sink.accept(i, chunk)?;
    }
    Ok(())
}
