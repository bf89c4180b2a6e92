//! Raw extracted rows and the per-row diagnostics produced while
//! normalizing them.

use serde::{Deserialize, Serialize};

use crate::StatField;

/// One unparsed table row: column labels (as printed in the source table)
/// paired with the cell text, in source column order.
///
/// `None` marks an absent value, either an empty cell or a trailing cell
/// the source row didn't have.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    cells: Vec<(String, Option<String>)>,
    padded: usize,
}

impl RawRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: Vec::new(),
            padded: 0,
        }
    }

    /// Builds a row from `(label, text)` pairs, all present.
    pub fn from_pairs<L, V>(pairs: impl IntoIterator<Item = (L, V)>) -> Self
    where
        L: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(label, value)| (label.into(), Some(value.into())))
                .collect(),
            padded: 0,
        }
    }

    /// Appends a cell.
    pub fn push(&mut self, label: impl Into<String>, value: Option<String>) {
        self.cells.push((label.into(), value));
    }

    /// Appends an absent cell that the source row was missing.
    pub fn push_padding(&mut self, label: impl Into<String>) {
        self.cells.push((label.into(), None));
        self.padded += 1;
    }

    /// Returns the text for `label`, or `None` if the label is unknown or
    /// the value is absent. The first occurrence wins on duplicate labels.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(l, _)| l == label)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Iterates over `(label, value)` pairs in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.cells.iter().map(|(l, v)| (l.as_str(), v.as_deref()))
    }

    /// Number of cells, including padding.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.cells.len()
    }

    /// Returns whether the row has no cells.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of trailing cells that were padded because the source row
    /// was shorter than the header.
    #[must_use]
    pub const fn padded(&self) -> usize {
        self.padded
    }
}

/// Why a single field was replaced with the missing sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldIssue {
    /// The text couldn't be parsed as the field's numeric type.
    NotNumeric,
    /// The value parsed but fell outside the configured bounds.
    OutOfBounds {
        /// Lower bound, if any.
        min: Option<f64>,
        /// Upper bound, if any.
        max: Option<f64>,
    },
}

/// A recoverable, row-local problem found while normalizing.
///
/// Diagnostics never abort a run; the affected row is still emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The source row had fewer cells than the header.
    RowShape {
        /// Zero-based data row index.
        row: usize,
        /// Header cell count.
        expected: usize,
        /// Cells actually present.
        found: usize,
    },
    /// A field failed coercion or its bounds check.
    FieldParse {
        /// Zero-based data row index.
        row: usize,
        /// The field that was dropped.
        field: StatField,
        /// The offending raw text.
        raw: String,
        /// What went wrong.
        issue: FieldIssue,
    },
}

impl Diagnostic {
    /// Returns the data row index the diagnostic refers to.
    #[must_use]
    pub const fn row(&self) -> usize {
        match self {
            Self::RowShape { row, .. } | Self::FieldParse { row, .. } => *row,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RowShape {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row}: {found} of {expected} cells present, padded with missing values"
            ),
            Self::FieldParse {
                row,
                field,
                raw,
                issue: FieldIssue::NotNumeric,
            } => write!(f, "row {row}: {field} value {raw:?} is not numeric"),
            Self::FieldParse {
                row,
                field,
                raw,
                issue: FieldIssue::OutOfBounds { min, max },
            } => write!(
                f,
                "row {row}: {field} value {raw:?} outside bounds [{}, {}]",
                min.map_or_else(|| "-inf".to_string(), |v| v.to_string()),
                max.map_or_else(|| "inf".to_string(), |v| v.to_string()),
            ),
        }
    }
}
