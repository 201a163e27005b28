//! Control points, working points and simulated output rows.

use serde::{Deserialize, Serialize};

use crate::{FitError, InvalidInput, PointTable};

/// Accepted header names for each control-point column, first match wins.
pub const TARGET_X_ALIASES: &[&str] = &["utm_e", "target_x"];
pub const TARGET_Y_ALIASES: &[&str] = &["utm_n", "target_y"];
pub const SOURCE_X_ALIASES: &[&str] = &["gx", "source_x"];
pub const SOURCE_Y_ALIASES: &[&str] = &["gy", "source_y"];
pub const TARGET_X_STDERR_ALIASES: &[&str] = &["utm_e_se", "target_x_stderr"];
pub const TARGET_Y_STDERR_ALIASES: &[&str] = &["utm_n_se", "target_y_stderr"];

/// A correspondence between a local (source) coordinate and a known target
/// coordinate, optionally with per-axis standard errors on the target side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    pub target_x: f64,
    pub target_y: f64,
    pub source_x: f64,
    pub source_y: f64,
    #[serde(default)]
    pub target_x_stderr: Option<f64>,
    #[serde(default)]
    pub target_y_stderr: Option<f64>,
}

impl ControlPoint {
    pub fn new(target_x: f64, target_y: f64, source_x: f64, source_y: f64) -> Self {
        Self {
            target_x,
            target_y,
            source_x,
            source_y,
            target_x_stderr: None,
            target_y_stderr: None,
        }
    }

    pub fn with_stderr(mut self, target_x_stderr: f64, target_y_stderr: f64) -> Self {
        self.target_x_stderr = Some(target_x_stderr);
        self.target_y_stderr = Some(target_y_stderr);
        self
    }

    /// Both standard errors, if both are present.
    pub fn stderr(&self) -> Option<(f64, f64)> {
        Some((self.target_x_stderr?, self.target_y_stderr?))
    }

    fn mode(&self) -> Option<UncertaintyMode> {
        match (self.target_x_stderr, self.target_y_stderr) {
            (Some(_), Some(_)) => Some(UncertaintyMode::WithStderr),
            (None, None) => Some(UncertaintyMode::None),
            _ => None,
        }
    }
}

/// Whether a control-point set carries target standard errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyMode {
    None,
    WithStderr,
}

/// A validated, ordered set of at least three control points sharing one
/// [`UncertaintyMode`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ControlPointSet {
    points: Vec<ControlPoint>,
    mode: UncertaintyMode,
}

impl ControlPointSet {
    /// Validate and wrap `points`.
    ///
    /// Rejects fewer than three points, non-finite coordinates, rows that
    /// carry only one standard error, sets that mix rows with and without
    /// standard errors, and negative or non-finite standard errors.
    pub fn new(points: Vec<ControlPoint>) -> Result<Self, FitError> {
        if points.len() < 3 {
            return Err(InvalidInput::TooFewPoints { got: points.len() }.into());
        }

        let mut mode = None;
        for (index, p) in points.iter().enumerate() {
            let this = p.mode().ok_or(InvalidInput::MixedUncertainty { index })?;
            match mode {
                None => mode = Some(this),
                Some(m) if m != this => {
                    return Err(InvalidInput::MixedUncertainty { index }.into());
                }
                Some(_) => {}
            }
        }

        for (index, p) in points.iter().enumerate() {
            let coords = [p.target_x, p.target_y, p.source_x, p.source_y];
            if coords.iter().any(|v| !v.is_finite()) {
                return Err(InvalidInput::NonFinite { index }.into());
            }
            if let Some((sx, sy)) = p.stderr() {
                if !(sx.is_finite() && sx >= 0.0 && sy.is_finite() && sy >= 0.0) {
                    return Err(InvalidInput::InvalidStderr { index }.into());
                }
            }
        }

        Ok(Self {
            points,
            mode: mode.unwrap_or(UncertaintyMode::None),
        })
    }

    /// Build a set from a loaded table.
    ///
    /// A 4-column table is the plain schema and a 6-column table carries
    /// standard errors; any other width is a [`FitError::DimensionMismatch`].
    /// Columns are resolved by name (case-insensitive), see the `*_ALIASES`
    /// constants.
    pub fn from_table(table: &PointTable) -> Result<Self, FitError> {
        let with_stderr = match table.num_columns() {
            4 => false,
            6 => true,
            columns => return Err(FitError::DimensionMismatch { columns }),
        };

        let col = |aliases: &[&str]| {
            table
                .column_index_any(aliases)
                .ok_or_else(|| InvalidInput::MissingColumn {
                    name: aliases.join("|"),
                })
        };
        let tx = col(TARGET_X_ALIASES)?;
        let ty = col(TARGET_Y_ALIASES)?;
        let sx = col(SOURCE_X_ALIASES)?;
        let sy = col(SOURCE_Y_ALIASES)?;
        let stderr_cols = if with_stderr {
            Some((col(TARGET_X_STDERR_ALIASES)?, col(TARGET_Y_STDERR_ALIASES)?))
        } else {
            None
        };

        let points = table
            .rows()
            .iter()
            .map(|r| {
                let p = ControlPoint::new(r[tx], r[ty], r[sx], r[sy]);
                match stderr_cols {
                    Some((ex, ey)) => p.with_stderr(r[ex], r[ey]),
                    None => p,
                }
            })
            .collect();
        Self::new(points)
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn mode(&self) -> UncertaintyMode {
        self.mode
    }

    pub fn has_uncertainty(&self) -> bool {
        self.mode == UncertaintyMode::WithStderr
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ControlPoint> {
        self.points.iter()
    }
}

impl<'a> IntoIterator for &'a ControlPointSet {
    type Item = &'a ControlPoint;
    type IntoIter = std::slice::Iter<'a, ControlPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// A point in the local coordinate system waiting to be transformed.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnprojectedPoint {
    pub uid: i64,
    pub x: f64,
    pub y: f64,
}

impl UnprojectedPoint {
    pub fn new(uid: i64, x: f64, y: f64) -> Self {
        Self { uid, x, y }
    }
}

/// A transformed point: the input coordinates plus their predicted targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub uid: i64,
    pub x: f64,
    pub y: f64,
    pub x_pred: f64,
    pub y_pred: f64,
}

/// One row of simulated output, tagged with its simulation index.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Realization {
    pub iteration: usize,
    pub uid: i64,
    pub x: f64,
    pub y: f64,
    pub x_pred: f64,
    pub y_pred: f64,
}

impl Realization {
    pub fn from_projected(iteration: usize, p: ProjectedPoint) -> Self {
        Self {
            iteration,
            uid: p.uid,
            x: p.x,
            y: p.y,
            x_pred: p.x_pred,
            y_pred: p.y_pred,
        }
    }
}
