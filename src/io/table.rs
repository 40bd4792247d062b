//! Parser for exported tabular field data.
//!
//! Boundary-element exports arrive as one text file per electrode: comment
//! rows prefixed with `%`, then one row per sample point with the
//! coordinate columns first and the physics quantities after, labels
//! supplied separately (e.g. `x,y,z,V` with 3 coordinate columns).

use std::collections::BTreeMap;

use crate::math::Scalar;
use crate::potential::{AxialSample, SampleError};

/// Errors raised while parsing tabular field data.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A requested column label is absent.
    #[error("column {0:?} not present in table")]
    MissingColumn(String),
    /// A data row has a different number of fields than there are labels.
    #[error("row {row} has {found} fields, expected {expected}")]
    ColumnCount {
        /// 1-based row number in the input text.
        row: usize,
        /// Fields found on the row.
        found: usize,
        /// Number of column labels.
        expected: usize,
    },
    /// A field failed to parse as a number.
    #[error("row {row}: cannot parse {token:?} as a number")]
    BadNumber {
        /// 1-based row number in the input text.
        row: usize,
        /// The offending field text.
        token: String,
    },
    /// Electrode tables disagree on the sampled coordinates.
    #[error("electrode {label:?} samples different coordinates than the first table")]
    CoordinateMismatch {
        /// Electrode whose coordinates differ.
        label: String,
    },
    /// The assembled sample data failed validation.
    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// One parsed export file: labeled coordinate and quantity columns.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    coordinate_labels: Vec<String>,
    columns: BTreeMap<String, Vec<Scalar>>,
}

impl ParsedTable {
    /// Parses `text` with the given column `labels`, the first
    /// `coordinate_columns` of which are coordinates.
    ///
    /// Rows starting with `%` or `#` and blank rows are skipped; fields are
    /// separated by commas and/or whitespace.
    ///
    /// # Panics
    /// Panics if `coordinate_columns` exceeds the number of labels.
    pub fn parse(
        text: &str,
        labels: &[&str],
        coordinate_columns: usize,
    ) -> Result<Self, TableError> {
        assert!(
            coordinate_columns <= labels.len(),
            "more coordinate columns than labels"
        );
        let mut columns: BTreeMap<String, Vec<Scalar>> =
            labels.iter().map(|l| ((*l).to_string(), Vec::new())).collect();

        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('%') || trimmed.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = trimmed
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            if fields.len() != labels.len() {
                return Err(TableError::ColumnCount {
                    row: index + 1,
                    found: fields.len(),
                    expected: labels.len(),
                });
            }
            for (label, field) in labels.iter().zip(&fields) {
                let value: Scalar = field.parse().map_err(|_| TableError::BadNumber {
                    row: index + 1,
                    token: (*field).to_string(),
                })?;
                columns
                    .get_mut(*label)
                    .expect("label inserted above")
                    .push(value);
            }
        }

        Ok(Self {
            coordinate_labels: labels[..coordinate_columns]
                .iter()
                .map(|l| (*l).to_string())
                .collect(),
            columns,
        })
    }

    /// A coordinate column by label.
    #[must_use]
    pub fn coordinate(&self, label: &str) -> Option<&[Scalar]> {
        if self.coordinate_labels.iter().any(|l| l == label) {
            self.columns.get(label).map(Vec::as_slice)
        } else {
            None
        }
    }

    /// A physics quantity column by label.
    #[must_use]
    pub fn quantity(&self, label: &str) -> Option<&[Scalar]> {
        if self.coordinate_labels.iter().any(|l| l == label) {
            None
        } else {
            self.columns.get(label).map(Vec::as_slice)
        }
    }

    /// Number of data rows.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }
}

/// Assembles an [`AxialSample`] from one parsed table per electrode.
///
/// Every table must carry the `axis` coordinate and the `quantity` column,
/// and all tables must sample identical coordinates.
pub fn axial_sample_from_tables<'a, I>(
    tables: I,
    axis: &str,
    quantity: &str,
) -> Result<AxialSample, TableError>
where
    I: IntoIterator<Item = (&'a str, &'a ParsedTable)>,
{
    let mut positions: Option<Vec<Scalar>> = None;
    let mut electrodes = BTreeMap::new();

    for (label, table) in tables {
        let coords = table
            .coordinate(axis)
            .ok_or_else(|| TableError::MissingColumn(axis.to_string()))?;
        let values = table
            .quantity(quantity)
            .ok_or_else(|| TableError::MissingColumn(quantity.to_string()))?;

        match &positions {
            None => positions = Some(coords.to_vec()),
            Some(first) => {
                if first.as_slice() != coords {
                    return Err(TableError::CoordinateMismatch {
                        label: label.to_string(),
                    });
                }
            }
        }
        electrodes.insert(label.to_string(), values.to_vec());
    }

    let positions = positions.ok_or(SampleError::Empty)?;
    Ok(AxialSample::new(positions, electrodes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DC1: &str = "\
% Model: trap.mph
% Description: Electric potential
-10.0, 0.0, 0.0, 0.8\n-5.0, 0.0, 0.0, 0.3\n0.0, 0.0, 0.0, 0.1\n5.0, 0.0, 0.0, 0.3\n10.0, 0.0, 0.0, 0.8\n";

    const DC2: &str = "\
% Model: trap.mph
-10.0, 0.0, 0.0, 0.1\n-5.0, 0.0, 0.0, 0.2\n0.0, 0.0, 0.0, 0.4\n5.0, 0.0, 0.0, 0.2\n10.0, 0.0, 0.0, 0.1\n";

    const LABELS: &[&str] = &["x", "y", "z", "V"];

    #[test]
    fn comment_rows_are_skipped() {
        let table = ParsedTable::parse(DC1, LABELS, 3).unwrap();
        assert_eq!(table.rows(), 5);
        assert_eq!(table.coordinate("x").unwrap()[0], -10.0);
        assert_eq!(table.quantity("V").unwrap()[2], 0.1);
    }

    #[test]
    fn coordinates_are_not_quantities_and_vice_versa() {
        let table = ParsedTable::parse(DC1, LABELS, 3).unwrap();
        assert!(table.quantity("x").is_none());
        assert!(table.coordinate("V").is_none());
    }

    #[test]
    fn bad_numbers_are_reported_with_row() {
        let text = "1.0, 2.0\nx, 4.0\n";
        let err = ParsedTable::parse(text, &["x", "V"], 1).unwrap_err();
        assert!(matches!(err, TableError::BadNumber { row: 2, .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let text = "1.0, 2.0, 3.0\n";
        let err = ParsedTable::parse(text, &["x", "V"], 1).unwrap_err();
        assert!(matches!(
            err,
            TableError::ColumnCount {
                row: 1,
                found: 3,
                expected: 2
            }
        ));
    }

    #[test]
    fn tables_assemble_into_a_sample() {
        let t1 = ParsedTable::parse(DC1, LABELS, 3).unwrap();
        let t2 = ParsedTable::parse(DC2, LABELS, 3).unwrap();
        let sample =
            axial_sample_from_tables(vec![("DC1", &t1), ("DC2", &t2)], "x", "V").unwrap();
        assert_eq!(sample.len(), 5);
        assert_eq!(sample.domain(), (-10.0, 10.0));
        assert_eq!(sample.electrode("DC2").unwrap()[2], 0.4);
    }

    #[test]
    fn mismatched_coordinates_are_rejected() {
        let t1 = ParsedTable::parse(DC1, LABELS, 3).unwrap();
        let shifted = DC2.replace("-5.0,", "-4.0,");
        let t2 = ParsedTable::parse(&shifted, LABELS, 3).unwrap();
        let err =
            axial_sample_from_tables(vec![("DC1", &t1), ("DC2", &t2)], "x", "V").unwrap_err();
        assert!(matches!(err, TableError::CoordinateMismatch { .. }));
    }
}
