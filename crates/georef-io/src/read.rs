//! CSV loaders for control points and unprojected points.

use std::{fs::File, io::Read, path::Path};

use georef_core::{ControlPointSet, PointTable, UnprojectedPoint};

use crate::{FieldNames, IoError, MissingPolicy};

/// How missing cells in the unprojected file are recognised and handled.
///
/// Only the uid/x/y cells are checked; a marker in any other column leaves
/// the row alone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MissingValues {
    pub marker: String,
    pub policy: MissingPolicy,
}

impl Default for MissingValues {
    fn default() -> Self {
        Self {
            marker: "NA".to_string(),
            policy: MissingPolicy::Drop,
        }
    }
}

impl MissingValues {
    fn is_missing(&self, cell: &str) -> bool {
        cell.is_empty() || cell == self.marker
    }
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn line_of(record: &csv::StringRecord, fallback: usize) -> u64 {
    record
        .position()
        .map(|p| p.line())
        .unwrap_or(fallback as u64 + 2)
}

fn parse_cell(value: &str, column: &str, line: u64) -> Result<f64, IoError> {
    value.parse::<f64>().map_err(|_| IoError::BadCell {
        line,
        column: column.to_string(),
        value: value.to_string(),
    })
}

/// Read a fully numeric CSV table with a header row.
pub fn read_table<R: Read>(input: R) -> Result<PointTable, IoError> {
    let mut rdr = reader(input);
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = line_of(&record, i);
        let row = record
            .iter()
            .zip(&columns)
            .map(|(cell, column)| parse_cell(cell, column, line))
            .collect::<Result<Vec<f64>, _>>()?;
        rows.push(row);
    }
    Ok(PointTable::new(columns, rows)?)
}

/// Parse control points from CSV.
///
/// The header decides the schema: four columns without standard errors or
/// six columns with them (see [`ControlPointSet::from_table`]).
pub fn read_control_points<R: Read>(input: R) -> Result<ControlPointSet, IoError> {
    let table = read_table(input)?;
    Ok(ControlPointSet::from_table(&table)?)
}

pub fn load_control_points(path: impl AsRef<Path>) -> Result<ControlPointSet, IoError> {
    let path = path.as_ref();
    let set = read_control_points(File::open(path)?)?;
    log::info!(
        "loaded {} control points from {} ({:?})",
        set.len(),
        path.display(),
        set.mode()
    );
    Ok(set)
}

/// Largest magnitude below which every integer is exactly representable as
/// an `f64` (2^53).
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Parse a uid cell as `i64`. Integral decimal spellings such as `3.0` are
/// accepted only while the value is exactly representable.
fn parse_uid(cell: &str, row: usize) -> Result<i64, IoError> {
    let invalid = || IoError::InvalidUid {
        row,
        value: cell.to_string(),
    };
    if let Ok(uid) = cell.parse::<i64>() {
        return Ok(uid);
    }
    let v = cell.parse::<f64>().map_err(|_| invalid())?;
    if v.is_finite() && v.fract() == 0.0 && v.abs() < MAX_EXACT_F64_INT {
        Ok(v as i64)
    } else {
        Err(invalid())
    }
}

/// Parse unprojected points from CSV, reading the uid/x/y columns named by
/// `fields` (case-insensitive). Other columns are ignored, may hold text,
/// and are not checked for the missing-value marker.
///
/// Uids are parsed as integers directly, so large ids keep full precision.
/// Under [`MissingPolicy::Drop`] a marker in any of the three columns drops
/// the row; under [`MissingPolicy::Coerce`] a missing uid is an error.
pub fn read_unprojected<R: Read>(
    input: R,
    fields: &FieldNames,
    missing: &MissingValues,
) -> Result<Vec<UnprojectedPoint>, IoError> {
    let mut rdr = reader(input);
    let headers = PointTable::new(
        rdr.headers()?.iter().map(str::to_string).collect(),
        Vec::new(),
    )?;
    let names = [fields.uid.as_str(), fields.x.as_str(), fields.y.as_str()];
    let mut idx = [0usize; 3];
    for (slot, name) in idx.iter_mut().zip(names) {
        *slot = headers
            .column_index(name)
            .ok_or_else(|| IoError::MissingField {
                name: name.to_string(),
            })?;
    }
    let [uid_col, x_col, y_col] = idx;

    let mut points = Vec::new();
    let mut dropped = 0usize;
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let line = line_of(&record, i);
        let cell = |col: usize| record.get(col).unwrap_or_default();

        let coords = [(x_col, names[1]), (y_col, names[2])];
        if missing.policy == MissingPolicy::Drop
            && [uid_col, x_col, y_col]
                .iter()
                .any(|&col| missing.is_missing(cell(col)))
        {
            dropped += 1;
            continue;
        }

        let uid = parse_uid(cell(uid_col), points.len())?;
        let mut xy = [f64::NAN; 2];
        for (v, &(col, name)) in xy.iter_mut().zip(&coords) {
            let raw = cell(col);
            if !missing.is_missing(raw) {
                *v = parse_cell(raw, name, line)?;
            }
        }
        points.push(UnprojectedPoint::new(uid, xy[0], xy[1]));
    }
    if dropped > 0 {
        log::info!("dropped {dropped} rows containing missing values");
    }
    Ok(points)
}

pub fn load_unprojected(
    path: impl AsRef<Path>,
    fields: &FieldNames,
    missing: &MissingValues,
) -> Result<Vec<UnprojectedPoint>, IoError> {
    let path = path.as_ref();
    let points = read_unprojected(File::open(path)?, fields, missing)?;
    log::info!(
        "loaded {} unprojected points from {}",
        points.len(),
        path.display()
    );
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use georef_core::{FitError, InvalidInput};

    const CONTROL: &str = "utm_e,utm_n,gx,gy
625790.088,1012275.575,0,500
626789.5653,1012243.118,1000,500
626773.3367,1011743.38,1000,0
625773.8594,1011775.837,0,0
";

    const CONTROL_SE: &str = "utm_e,utm_n,gx,gy,utm_e_se,utm_n_se
625790.088,1012275.575,0,500,10,3
626789.5653,1012243.118,1000,500,2,3
626773.3367,1011743.38,1000,0,3,1
625773.8594,1011775.837,0,0,2,4
";

    fn fields() -> FieldNames {
        FieldNames::new("uid", "gx", "gy")
    }

    #[test]
    fn reads_plain_control_points() {
        let set = read_control_points(CONTROL.as_bytes()).expect("control points");
        assert_eq!(set.len(), 4);
        assert!(!set.has_uncertainty());
        let p = set.points()[1];
        assert_eq!((p.target_x, p.target_y), (626789.5653, 1012243.118));
        assert_eq!((p.source_x, p.source_y), (1000.0, 500.0));
    }

    #[test]
    fn reads_control_points_with_stderr() {
        let set = read_control_points(CONTROL_SE.as_bytes()).expect("control points");
        assert!(set.has_uncertainty());
        assert_eq!(set.points()[0].stderr(), Some((10.0, 3.0)));
        assert_eq!(set.points()[3].stderr(), Some((2.0, 4.0)));
    }

    #[test]
    fn five_column_control_file_is_a_dimension_mismatch() {
        let csv = "utm_e,utm_n,gx,gy,utm_e_se\n1,2,0,0,1\n3,4,1,0,1\n5,6,0,1,1\n";
        let err = read_control_points(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Fit(FitError::DimensionMismatch { columns: 5 })
        ));
    }

    #[test]
    fn too_few_control_points_are_invalid() {
        let csv = "utm_e,utm_n,gx,gy\n1,2,0,0\n3,4,1,0\n";
        let err = read_control_points(csv.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Fit(FitError::InvalidInput(InvalidInput::TooFewPoints { got: 2 }))
        ));
    }

    #[test]
    fn non_numeric_control_cell_is_reported() {
        let csv = "utm_e,utm_n,gx,gy\n1,2,0,0\n3,x4,1,0\n5,6,0,1\n";
        match read_control_points(csv.as_bytes()).unwrap_err() {
            IoError::BadCell {
                line,
                column,
                value,
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, "utm_n");
                assert_eq!(value, "x4");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unprojected_columns_are_found_case_insensitively() {
        let csv = "UID,label,GX,GY\n1,a,9,30\n2,b,9,70\n3.0,c,29,10\n";
        let pts = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .expect("points");
        assert_eq!(
            pts,
            vec![
                UnprojectedPoint::new(1, 9.0, 30.0),
                UnprojectedPoint::new(2, 9.0, 70.0),
                UnprojectedPoint::new(3, 29.0, 10.0),
            ]
        );
    }

    #[test]
    fn missing_rows_are_dropped_by_default() {
        let csv = "uid,gx,gy\n1,9,30\n2,NA,70\n3,29,\n4,29,50\n";
        let pts = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .expect("points");
        let uids: Vec<i64> = pts.iter().map(|p| p.uid).collect();
        assert_eq!(uids, vec![1, 4]);
    }

    #[test]
    fn missing_cells_can_be_coerced_to_nan() {
        let csv = "uid,gx,gy\n1,9,30\n2,NA,70\n";
        let missing = MissingValues {
            marker: "NA".into(),
            policy: MissingPolicy::Coerce,
        };
        let pts = read_unprojected(csv.as_bytes(), &fields(), &missing).expect("points");
        assert_eq!(pts.len(), 2);
        assert!(pts[1].x.is_nan());
        assert_eq!(pts[1].y, 70.0);
    }

    #[test]
    fn coerced_uid_is_rejected() {
        let csv = "uid,gx,gy\nNA,9,30\n";
        let missing = MissingValues {
            marker: "NA".into(),
            policy: MissingPolicy::Coerce,
        };
        let err = read_unprojected(csv.as_bytes(), &fields(), &missing).unwrap_err();
        assert!(matches!(err, IoError::InvalidUid { row: 0, .. }));
    }

    #[test]
    fn fractional_uid_is_rejected() {
        let csv = "uid,gx,gy\n1.5,9,30\n";
        let err = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidUid { .. }));
    }

    #[test]
    fn large_uids_keep_full_precision() {
        let csv = "uid,gx,gy\n9007199254740993,9,30\n9007199254740992,9,70\n";
        let pts = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .expect("points");
        let uids: Vec<i64> = pts.iter().map(|p| p.uid).collect();
        assert_eq!(uids, vec![9_007_199_254_740_993, 9_007_199_254_740_992]);
    }

    #[test]
    fn uid_beyond_i64_is_rejected() {
        let csv = "uid,gx,gy\n9223372036854775808,9,30\n";
        let err = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidUid { row: 0, .. }));
    }

    #[test]
    fn inexact_decimal_uid_is_rejected() {
        let csv = "uid,gx,gy\n9007199254740993.0,9,30\n";
        let err = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .unwrap_err();
        assert!(matches!(err, IoError::InvalidUid { .. }));
    }

    #[test]
    fn marker_in_unused_column_keeps_the_row() {
        let csv = "uid,extra,gx,gy\n1,NA,9,30\n2,b,9,70\n";
        let pts = read_unprojected(csv.as_bytes(), &fields(), &MissingValues::default())
            .expect("points");
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn unknown_field_name_is_reported() {
        let csv = "uid,gx,gy\n1,9,30\n";
        let err = read_unprojected(
            csv.as_bytes(),
            &FieldNames::new("uid", "east", "gy"),
            &MissingValues::default(),
        )
        .unwrap_err();
        assert!(matches!(err, IoError::MissingField { ref name } if name == "east"));
    }
}
