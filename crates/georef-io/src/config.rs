//! JSON run configuration.

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{IoError, MissingValues};

/// What to do with unprojected rows that contain the missing-value marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Skip the whole row.
    #[default]
    Drop,
    /// Keep the row; missing coordinates become NaN and propagate to NaN
    /// predictions. The uid must still be present.
    Coerce,
}

/// Header names of the uid and coordinate columns in the unprojected file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldNames {
    pub uid: String,
    pub x: String,
    pub y: String,
}

impl FieldNames {
    pub fn new(uid: impl Into<String>, x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            x: x.into(),
            y: y.into(),
        }
    }
}

fn default_seed() -> u64 {
    10
}

fn default_missing_marker() -> String {
    "NA".to_string()
}

/// Everything needed for one projection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub control_points: PathBuf,
    pub unprojected: PathBuf,
    pub fields: FieldNames,
    /// Outputs are written to `<output_prefix>-projected.csv` and, when
    /// simulating, `<output_prefix>-sim.csv` and `<output_prefix>-spread.csv`.
    pub output_prefix: String,
    #[serde(default)]
    pub n_sims: Option<usize>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub missing: MissingPolicy,
    #[serde(default = "default_missing_marker")]
    pub missing_marker: String,
    /// Run simulation iterations on independent per-iteration generators.
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub report: Option<PathBuf>,
}

impl RunConfig {
    pub fn new(
        control_points: impl Into<PathBuf>,
        unprojected: impl Into<PathBuf>,
        fields: FieldNames,
        output_prefix: impl Into<String>,
    ) -> Self {
        Self {
            control_points: control_points.into(),
            unprojected: unprojected.into(),
            fields,
            output_prefix: output_prefix.into(),
            n_sims: None,
            seed: default_seed(),
            missing: MissingPolicy::default(),
            missing_marker: default_missing_marker(),
            parallel: false,
            report: None,
        }
    }

    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn missing_values(&self) -> MissingValues {
        MissingValues {
            marker: self.missing_marker.clone(),
            policy: self.missing,
        }
    }

    pub fn projected_path(&self) -> PathBuf {
        self.output_path("projected")
    }

    pub fn sim_path(&self) -> PathBuf {
        self.output_path("sim")
    }

    pub fn spread_path(&self) -> PathBuf {
        self.output_path("spread")
    }

    fn output_path(&self, suffix: &str) -> PathBuf {
        PathBuf::from(format!("{}-{}.csv", self.output_prefix, suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_optional_fields() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{
                "control_points": "cp.csv",
                "unprojected": "pts.csv",
                "fields": { "uid": "uid", "x": "gx", "y": "gy" },
                "output_prefix": "out/run"
            }"#,
        )
        .expect("parse");
        assert_eq!(cfg.seed, 10);
        assert_eq!(cfg.n_sims, None);
        assert_eq!(cfg.missing, MissingPolicy::Drop);
        assert_eq!(cfg.missing_marker, "NA");
        assert!(!cfg.parallel);
        assert_eq!(cfg.projected_path(), PathBuf::from("out/run-projected.csv"));
        assert_eq!(cfg.sim_path(), PathBuf::from("out/run-sim.csv"));
        assert_eq!(cfg.spread_path(), PathBuf::from("out/run-spread.csv"));
    }

    #[test]
    fn json_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("run.json");
        let mut cfg = RunConfig::new("cp.csv", "pts.csv", FieldNames::new("id", "x", "y"), "o");
        cfg.n_sims = Some(25);
        cfg.missing = MissingPolicy::Coerce;
        cfg.write_json(&path).expect("write");
        assert_eq!(RunConfig::load_json(&path).expect("load"), cfg);
    }
}
