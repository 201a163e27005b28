//! georef CLI: fit an affine transform from control points, project points,
//! and optionally simulate the effect of control-point uncertainty.

use clap::{Parser, ValueEnum};
use std::{error::Error, path::PathBuf, process::ExitCode};

use georef::{run, FieldNames, MissingPolicy, RunConfig, RunError};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MissingArg {
    /// Skip rows containing the missing-value marker.
    Drop,
    /// Keep such rows; missing coordinates project to NA.
    Coerce,
}

impl From<MissingArg> for MissingPolicy {
    fn from(arg: MissingArg) -> Self {
        match arg {
            MissingArg::Drop => MissingPolicy::Drop,
            MissingArg::Coerce => MissingPolicy::Coerce,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "georef")]
#[command(about = "Project points through an affine fit to survey control points")]
#[command(version)]
struct Cli {
    /// JSON run configuration. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control-point CSV (utm_e,utm_n,gx,gy[,utm_e_se,utm_n_se]).
    #[arg(short = 'c', long)]
    control_points: Option<PathBuf>,

    /// CSV of points to project.
    #[arg(short = 'u', long)]
    unprojected: Option<PathBuf>,

    /// Name of the uid column in the unprojected file.
    #[arg(short = 'i', long)]
    uid: Option<String>,

    /// Name of the x column in the unprojected file.
    #[arg(short = 'x', long)]
    xname: Option<String>,

    /// Name of the y column in the unprojected file.
    #[arg(short = 'y', long)]
    yname: Option<String>,

    /// Output prefix; writes <prefix>-projected.csv and, when simulating,
    /// <prefix>-sim.csv and <prefix>-spread.csv.
    #[arg(short = 'o', long)]
    output: Option<String>,

    /// Number of Monte Carlo realizations. Requires control-point standard errors.
    #[arg(short = 'n', long)]
    nsims: Option<usize>,

    /// Seed for the simulation generator (default 10).
    #[arg(long)]
    seed: Option<u64>,

    /// How to treat rows with missing coordinates.
    #[arg(long, value_enum)]
    missing: Option<MissingArg>,

    /// Run simulation iterations in parallel (requires the `rayon` feature).
    #[arg(long)]
    parallel: bool,

    /// Write a JSON run report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log progress to stderr.
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig, RunError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_json(path)?,
            None => RunConfig::new(
                self.control_points
                    .clone()
                    .ok_or(RunError::MissingSetting("--control-points"))?,
                self.unprojected
                    .clone()
                    .ok_or(RunError::MissingSetting("--unprojected"))?,
                FieldNames::new(
                    self.uid.clone().ok_or(RunError::MissingSetting("--uid"))?,
                    self.xname.clone().ok_or(RunError::MissingSetting("--xname"))?,
                    self.yname.clone().ok_or(RunError::MissingSetting("--yname"))?,
                ),
                self.output.clone().ok_or(RunError::MissingSetting("--output"))?,
            ),
        };

        if let Some(v) = self.control_points {
            config.control_points = v;
        }
        if let Some(v) = self.unprojected {
            config.unprojected = v;
        }
        if let Some(v) = self.uid {
            config.fields.uid = v;
        }
        if let Some(v) = self.xname {
            config.fields.x = v;
        }
        if let Some(v) = self.yname {
            config.fields.y = v;
        }
        if let Some(v) = self.output {
            config.output_prefix = v;
        }
        if self.nsims.is_some() {
            config.n_sims = self.nsims;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.missing {
            config.missing = v.into();
        }
        if self.parallel {
            config.parallel = true;
        }
        if self.report.is_some() {
            config.report = self.report;
        }
        Ok(config)
    }
}

#[cfg(feature = "tracing")]
fn init_logging(_verbose: bool) {
    georef::core::init_tracing(false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging(verbose: bool) {
    if let Err(e) = georef::core::init_with_level(georef::core::level_for_verbosity(verbose)) {
        eprintln!("warning: logger already installed: {e}");
    }
}

fn report_error(err: &dyn Error) {
    eprintln!("error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = cli.into_config().and_then(|config| run(&config));
    match result {
        Ok(report) => {
            log::info!("outputs: {}", report.outputs.join(", "));
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}
