//! Column-addressable numeric table shared by the loaders and the core.

use serde::{Deserialize, Serialize};

use crate::TableError;

/// An in-memory table of `f64` rows with named columns.
///
/// Column lookup is case-insensitive. Missing cells are represented as NaN by
/// the loaders that build the table; the table itself never interprets them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointTable {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl PointTable {
    /// Build a table, checking that every row matches the header width and
    /// that no two columns share a (case-insensitive) name.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, TableError> {
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.eq_ignore_ascii_case(name)) {
                return Err(TableError::DuplicateColumn { name: name.clone() });
            }
        }
        for (row, cells) in rows.iter().enumerate() {
            if cells.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row,
                    expected: columns.len(),
                    got: cells.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Index of the column called `name`, ignoring ASCII case.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name.trim()))
    }

    /// First column whose name matches any of `aliases`, in alias order.
    pub fn column_index_any(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.column_index(a))
    }

    /// Iterate the values of one column by name.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = f64> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r[idx]))
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Project the table onto the named columns, in the given order.
    ///
    /// Returns `None` if any name is not present.
    pub fn select(&self, names: &[&str]) -> Option<PointTable> {
        let idx: Vec<usize> = names
            .iter()
            .map(|n| self.column_index(n))
            .collect::<Option<_>>()?;
        let columns = idx.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|r| idx.iter().map(|&i| r[i]).collect())
            .collect();
        Some(PointTable { columns, rows })
    }
}
