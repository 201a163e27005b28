//! High-level facade crate for the `georef-*` workspace.
//!
//! This crate provides:
//! - re-exports of the numerical core (`georef-core`) and the CSV/JSON layer
//!   (`georef-io`)
//! - [`run`], the end-to-end pipeline used by the `georef` binary: load
//!   control points and unprojected points, fit the nominal affine transform,
//!   write projected coordinates, and optionally propagate control-point
//!   standard errors into a Monte Carlo ensemble.
//!
//! ## Quickstart
//!
//! ```no_run
//! use georef::{run, FieldNames, RunConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = RunConfig::new(
//!     "control.csv",
//!     "points.csv",
//!     FieldNames::new("uid", "gx", "gy"),
//!     "out/site",
//! );
//! config.n_sims = Some(500);
//! let report = run(&config)?;
//! println!("rms = {:.3}, wrote {:?}", report.rms, report.outputs);
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `georef::core`: control points, the affine estimator, draws and the
//!   uncertainty propagator.
//! - `georef::io`: loaders, writers, run configuration and run report.

pub use georef_core as core;
pub use georef_io as io;

pub use georef_core::{
    fit, fit_with_residuals, simulate, simulate_into, AffineTransform, ControlPoint,
    ControlPointSet, DrawSource, FitError, Realization, UnprojectedPoint,
};
pub use georef_io::{FieldNames, IoError, MissingPolicy, RunConfig, RunReport};

mod run;

pub use run::{run, RunError};
