//! CSV writers for projected points, simulated realizations and spreads.
//!
//! Uids and iteration indices are written as integers; NaN coordinates are
//! written as `NA`.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use georef_core::{PointSpread, ProjectedPoint, Realization, RealizationSink};

use crate::IoError;

pub const PROJECTED_HEADER: [&str; 5] = ["uid", "x", "y", "x_pred", "y_pred"];
pub const SIM_HEADER: [&str; 6] = ["iteration", "uid", "x", "y", "x_pred", "y_pred"];
pub const SPREAD_HEADER: [&str; 8] = [
    "uid",
    "x",
    "y",
    "samples",
    "x_pred_mean",
    "y_pred_mean",
    "x_pred_std",
    "y_pred_std",
];

/// Render a float for output. Finite values use the shortest representation
/// that round-trips.
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NA".to_string()
    } else {
        v.to_string()
    }
}

fn create(path: &Path) -> Result<BufWriter<File>, IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

pub fn write_projected<W: Write>(out: W, rows: &[ProjectedPoint]) -> Result<(), IoError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(PROJECTED_HEADER)?;
    for r in rows {
        w.write_record([
            r.uid.to_string(),
            format_value(r.x),
            format_value(r.y),
            format_value(r.x_pred),
            format_value(r.y_pred),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_projected(path: impl AsRef<Path>, rows: &[ProjectedPoint]) -> Result<(), IoError> {
    let path = path.as_ref();
    write_projected(create(path)?, rows)?;
    log::info!("wrote {} projected points to {}", rows.len(), path.display());
    Ok(())
}

pub fn write_spread<W: Write>(out: W, rows: &[PointSpread]) -> Result<(), IoError> {
    let mut w = csv::Writer::from_writer(out);
    w.write_record(SPREAD_HEADER)?;
    for r in rows {
        w.write_record([
            r.uid.to_string(),
            format_value(r.x),
            format_value(r.y),
            r.samples.to_string(),
            format_value(r.x_pred_mean),
            format_value(r.y_pred_mean),
            format_value(r.x_pred_std),
            format_value(r.y_pred_std),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_spread(path: impl AsRef<Path>, rows: &[PointSpread]) -> Result<(), IoError> {
    let path = path.as_ref();
    write_spread(create(path)?, rows)?;
    log::info!("wrote spread of {} points to {}", rows.len(), path.display());
    Ok(())
}

/// Streams simulated realizations to CSV, one iteration at a time.
pub struct SimWriter<W: Write> {
    csv: csv::Writer<W>,
    rows: usize,
}

impl SimWriter<BufWriter<File>> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, IoError> {
        Self::new(create(path.as_ref())?)
    }
}

impl<W: Write> SimWriter<W> {
    /// Wrap `out` and write the header row.
    pub fn new(out: W) -> Result<Self, IoError> {
        let mut csv = csv::Writer::from_writer(out);
        csv.write_record(SIM_HEADER)?;
        Ok(Self { csv, rows: 0 })
    }

    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn write_rows(&mut self, rows: &[Realization]) -> Result<(), IoError> {
        for r in rows {
            self.csv.write_record([
                r.iteration.to_string(),
                r.uid.to_string(),
                format_value(r.x),
                format_value(r.y),
                format_value(r.x_pred),
                format_value(r.y_pred),
            ])?;
        }
        self.rows += rows.len();
        Ok(())
    }

    /// Flush and return the underlying writer.
    pub fn finish(self) -> Result<W, IoError> {
        self.csv
            .into_inner()
            .map_err(|e| IoError::Io(e.into_error()))
    }
}

impl<W: Write> RealizationSink for SimWriter<W> {
    type Error = IoError;

    fn accept(&mut self, _iteration: usize, rows: &[Realization]) -> Result<(), IoError> {
        self.write_rows(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).expect("utf8")
    }

    #[test]
    fn projected_rows_use_integer_uids() {
        let mut buf = Vec::new();
        write_projected(
            &mut buf,
            &[ProjectedPoint {
                uid: 12,
                x: 9.0,
                y: 30.5,
                x_pred: 626281.71235,
                y_pred: f64::NAN,
            }],
        )
        .expect("write");
        assert_eq!(
            text(buf),
            "uid,x,y,x_pred,y_pred\n12,9,30.5,626281.71235,NA\n"
        );
    }

    #[test]
    fn sim_writer_streams_iterations() {
        let row = |iteration| Realization {
            iteration,
            uid: 3,
            x: 1.0,
            y: 2.0,
            x_pred: 10.25,
            y_pred: 20.0,
        };
        let mut w = SimWriter::new(Vec::new()).expect("writer");
        w.accept(0, &[row(0)]).expect("iteration 0");
        w.accept(1, &[row(1)]).expect("iteration 1");
        assert_eq!(w.rows_written(), 2);
        let out = text(w.finish().expect("finish"));
        assert_eq!(
            out,
            "iteration,uid,x,y,x_pred,y_pred\n0,3,1,2,10.25,20\n1,3,1,2,10.25,20\n"
        );
    }

    #[test]
    fn spread_rows_include_sample_count() {
        let mut buf = Vec::new();
        write_spread(
            &mut buf,
            &[PointSpread {
                uid: 1,
                x: 0.0,
                y: 0.0,
                samples: 50,
                x_pred_mean: 1.5,
                y_pred_mean: 2.5,
                x_pred_std: 0.25,
                y_pred_std: 0.0,
            }],
        )
        .expect("write");
        let out = text(buf);
        assert!(out.starts_with("uid,x,y,samples,"));
        assert!(out.ends_with("1,0,0,50,1.5,2.5,0.25,0\n"));
    }
}
