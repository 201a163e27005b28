//! Affine control-point fitting and uncertainty propagation.
//!
//! This crate is the numerical core of `georef`. It fits the six coefficients
//! of a 2D affine transform to labeled control points by ordinary least
//! squares, applies the transform to arbitrary point sets, and propagates
//! per-axis control-point standard errors into the output coordinates with a
//! seeded Monte Carlo loop. It performs no I/O.
//!
//! ```
//! use georef_core::{fit, simulate, ControlPoint, ControlPointSet, DrawSource, UnprojectedPoint};
//!
//! # fn main() -> Result<(), georef_core::FitError> {
//! let control = ControlPointSet::new(vec![
//!     ControlPoint::new(100.0, 200.0, 0.0, 0.0).with_stderr(0.5, 0.5),
//!     ControlPoint::new(110.0, 200.0, 10.0, 0.0).with_stderr(0.5, 0.5),
//!     ControlPoint::new(110.0, 210.0, 10.0, 10.0).with_stderr(0.5, 0.5),
//! ])?;
//! let transform = fit(&control)?;
//! let points = [UnprojectedPoint::new(1, 5.0, 5.0)];
//! let nominal = transform.apply_points(&points);
//! assert!((nominal[0].x_pred - 105.0).abs() < 1e-9);
//!
//! let ensemble = simulate(&control, &points, 100, &mut DrawSource::new(10))?;
//! assert_eq!(ensemble.len(), 100);
//! # Ok(())
//! # }
//! ```

mod affine;
mod assemble;
mod draw;
mod error;
mod logger;
mod points;
mod simulate;
mod table;

pub use affine::{fit, fit_with_residuals, AffineEstimator, AffineFit, AffineTransform};
pub use assemble::{Ensemble, PointSpread, RealizationSink, SpreadAccumulator};
pub use draw::DrawSource;
pub use error::{FitError, InvalidInput, TableError};
pub use points::{
    ControlPoint, ControlPointSet, ProjectedPoint, Realization, UncertaintyMode,
    UnprojectedPoint, SOURCE_X_ALIASES, SOURCE_Y_ALIASES, TARGET_X_ALIASES,
    TARGET_X_STDERR_ALIASES, TARGET_Y_ALIASES, TARGET_Y_STDERR_ALIASES,
};
#[cfg(feature = "rayon")]
pub use simulate::simulate_parallel;
pub use simulate::{simulate, simulate_into};
pub use table::PointTable;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, level_for_verbosity};
