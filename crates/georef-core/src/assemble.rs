//! Collecting and summarizing simulated realizations.

use serde::{Deserialize, Serialize};

use crate::{FitError, Realization};

/// Receives the realizations of one simulation iteration at a time.
///
/// Iterations are delivered in increasing order; within an iteration rows
/// follow the order of the unprojected input points.
pub trait RealizationSink {
    type Error: From<FitError>;

    fn accept(&mut self, iteration: usize, rows: &[Realization]) -> Result<(), Self::Error>;
}

impl<S: RealizationSink + ?Sized> RealizationSink for &mut S {
    type Error = S::Error;

    fn accept(&mut self, iteration: usize, rows: &[Realization]) -> Result<(), Self::Error> {
        (**self).accept(iteration, rows)
    }
}

/// Fan out to two sinks; the first sink's error type is used.
impl<A, B> RealizationSink for (A, B)
where
    A: RealizationSink,
    B: RealizationSink,
    A::Error: From<B::Error>,
{
    type Error = A::Error;

    fn accept(&mut self, iteration: usize, rows: &[Realization]) -> Result<(), Self::Error> {
        self.0.accept(iteration, rows)?;
        self.1.accept(iteration, rows)?;
        Ok(())
    }
}

/// The full ordered ensemble, grouped by iteration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    realizations: Vec<Realization>,
    points_per_iteration: usize,
    iterations: usize,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(iterations: usize, points_per_iteration: usize) -> Self {
        Self {
            realizations: Vec::with_capacity(iterations * points_per_iteration),
            points_per_iteration,
            iterations: 0,
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn points_per_iteration(&self) -> usize {
        self.points_per_iteration
    }

    pub fn len(&self) -> usize {
        self.realizations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.realizations.is_empty()
    }

    pub fn realizations(&self) -> &[Realization] {
        &self.realizations
    }

    /// Rows of iteration `i`, if it exists.
    pub fn iteration(&self, i: usize) -> Option<&[Realization]> {
        if i >= self.iterations {
            return None;
        }
        let start = i * self.points_per_iteration;
        self.realizations
            .get(start..start + self.points_per_iteration)
    }

    /// Per-point spread of the predicted coordinates across iterations.
    pub fn spread(&self) -> Vec<PointSpread> {
        let mut acc = SpreadAccumulator::new();
        for i in 0..self.iterations {
            if let Some(rows) = self.iteration(i) {
                acc.push(rows);
            }
        }
        acc.finish()
    }

    pub fn into_vec(self) -> Vec<Realization> {
        self.realizations
    }
}

impl RealizationSink for Ensemble {
    type Error = FitError;

    fn accept(&mut self, iteration: usize, rows: &[Realization]) -> Result<(), FitError> {
        debug_assert_eq!(iteration, self.iterations);
        if self.iterations == 0 {
            self.points_per_iteration = rows.len();
        }
        debug_assert_eq!(rows.len(), self.points_per_iteration);
        self.realizations.extend_from_slice(rows);
        self.iterations += 1;
        Ok(())
    }
}

/// Mean and sample standard deviation of one point's predictions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSpread {
    pub uid: i64,
    pub x: f64,
    pub y: f64,
    pub samples: usize,
    pub x_pred_mean: f64,
    pub y_pred_mean: f64,
    /// Zero when fewer than two samples were seen.
    pub x_pred_std: f64,
    pub y_pred_std: f64,
}

#[derive(Clone, Copy, Debug)]
struct Welford {
    n: usize,
    mean: f64,
    m2: f64,
}

impl Welford {
    const EMPTY: Welford = Welford {
        n: 0,
        mean: 0.0,
        m2: 0.0,
    };

    #[inline]
    fn push(&mut self, v: f64) {
        self.n += 1;
        let delta = v - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (v - self.mean);
    }

    fn std(&self) -> f64 {
        if self.n < 2 {
            0.0
        } else {
            (self.m2 / (self.n - 1) as f64).sqrt()
        }
    }
}

/// Streaming per-point summary of an ensemble.
#[derive(Clone, Debug, Default)]
pub struct SpreadAccumulator {
    points: Vec<(Realization, Welford, Welford)>,
}

impl SpreadAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, rows: &[Realization]) {
        if self.points.is_empty() {
            self.points = rows
                .iter()
                .map(|r| (*r, Welford::EMPTY, Welford::EMPTY))
                .collect();
        }
        debug_assert_eq!(rows.len(), self.points.len());
        for ((_, wx, wy), r) in self.points.iter_mut().zip(rows) {
            wx.push(r.x_pred);
            wy.push(r.y_pred);
        }
    }

    pub fn finish(self) -> Vec<PointSpread> {
        self.points
            .into_iter()
            .map(|(r, wx, wy)| PointSpread {
                uid: r.uid,
                x: r.x,
                y: r.y,
                samples: wx.n,
                x_pred_mean: wx.mean,
                y_pred_mean: wy.mean,
                x_pred_std: wx.std(),
                y_pred_std: wy.std(),
            })
            .collect()
    }
}

impl RealizationSink for SpreadAccumulator {
    type Error = FitError;

    fn accept(&mut self, _iteration: usize, rows: &[Realization]) -> Result<(), FitError> {
        self.push(rows);
        Ok(())
    }
}
