//! JSON summary of a projection run.

use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use georef_core::{AffineFit, AffineTransform, UncertaintyMode};

use crate::IoError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub control_points: usize,
    pub uncertainty: UncertaintyMode,
    pub unprojected_points: usize,
    pub transform: AffineTransform,
    /// RMS distance between fitted and observed control-point targets.
    pub rms: f64,
    pub residuals: Vec<[f64; 2]>,
    #[serde(default)]
    pub n_sims: Option<usize>,
    pub seed: u64,
    #[serde(default)]
    pub parallel: bool,
    pub outputs: Vec<String>,
    pub elapsed_s: f64,
}

impl RunReport {
    /// Start a report from the nominal fit; outputs and timing are filled in
    /// by the caller.
    pub fn new(
        control_points: usize,
        uncertainty: UncertaintyMode,
        unprojected_points: usize,
        fit: &AffineFit,
        seed: u64,
    ) -> Self {
        Self {
            control_points,
            uncertainty,
            unprojected_points,
            transform: fit.transform,
            rms: fit.rms,
            residuals: fit.residuals.clone(),
            n_sims: None,
            seed,
            parallel: false,
            outputs: Vec::new(),
            elapsed_s: 0.0,
        }
    }

    pub fn add_output(&mut self, path: impl AsRef<Path>) {
        self.outputs
            .push(path.as_ref().to_string_lossy().into_owned());
    }

    /// Load a report from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this report to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_round_trips() {
        let fit = AffineFit {
            transform: AffineTransform::new(1.0, 0.0, 5.0, 0.0, 1.0, 7.0),
            residuals: vec![[0.5, -0.5], [-0.5, 0.5]],
            rms: 0.5,
        };
        let mut report = RunReport::new(4, UncertaintyMode::WithStderr, 20, &fit, 10);
        report.n_sims = Some(100);
        report.add_output("out-projected.csv");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("report.json");
        report.write_json(&path).expect("write");
        let back = RunReport::load_json(&path).expect("load");
        assert_eq!(back, report);
        assert_eq!(back.transform.c, 5.0);
    }
}
