//! Row normalization.
//!
//! [`Normalizer`] maps each [`RawRow`] onto exactly one [`PlayerStatRecord`].
//! Rows are never merged: a traded player's per-team rows and their `TOT`
//! aggregate all come out as separate records.
//!
//! Problems are recovered locally. A field that fails coercion or its bounds
//! check is left missing and reported as a [`Diagnostic`]; the row is still
//! emitted. Output depends only on the input rows and the schema.

use nba_stats_models::{
    Diagnostic, FieldIssue, FieldKind, PlayerStatRecord, RawRow, StatField, TableSchema,
};

use crate::parsing::{parse_float, parse_integer};
use crate::text::clean_text;

/// Records produced from a row sequence plus the warnings raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// One record per input row, in input order.
    pub records: Vec<PlayerStatRecord>,
    /// Row-local warnings, in row order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts raw rows to typed records under a [`TableSchema`].
#[derive(Debug, Clone, Copy)]
pub struct Normalizer<'a> {
    schema: &'a TableSchema,
}

impl<'a> Normalizer<'a> {
    /// Creates a normalizer for `schema`.
    #[must_use]
    pub const fn new(schema: &'a TableSchema) -> Self {
        Self { schema }
    }

    /// Normalizes every row, keeping input order.
    pub fn normalize<I>(&self, rows: I) -> Normalized
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut out = Normalized::default();
        for (index, row) in rows.into_iter().enumerate() {
            let record = self.normalize_row(index, &row, &mut out.diagnostics);
            out.records.push(record);
        }
        out
    }

    /// Normalizes a single row, appending any warnings to `diagnostics`.
    ///
    /// `index` is the zero-based data row number used in diagnostics.
    pub fn normalize_row(
        &self,
        index: usize,
        row: &RawRow,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> PlayerStatRecord {
        let mut record = PlayerStatRecord::default();

        if row.padded() > 0 {
            diagnostics.push(Diagnostic::RowShape {
                row: index,
                expected: row.len(),
                found: row.len() - row.padded(),
            });
        }

        for (label, value) in row.cells() {
            let Some(field) = self.schema.field_for_label(label) else {
                continue;
            };
            let Some(raw) = value else {
                continue;
            };
            // First present value wins when two labels map to one field.
            if !record.value(field).is_missing() {
                continue;
            }
            self.apply(&mut record, index, field, raw, diagnostics);
        }

        record
    }

    fn apply(
        &self,
        record: &mut PlayerStatRecord,
        index: usize,
        field: StatField,
        raw: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        match field.kind() {
            FieldKind::Text => {
                if let Some(slot) = record.text_mut(field) {
                    *slot = clean_text(raw);
                }
            }
            FieldKind::Integer => {
                let value = self.coerce(index, field, raw, parse_integer, diagnostics);
                if let Some(slot) = record.integer_mut(field) {
                    *slot = value;
                }
            }
            FieldKind::Float | FieldKind::Percentage => {
                let value = self.coerce(index, field, raw, parse_float, diagnostics);
                if let Some(slot) = record.float_mut(field) {
                    *slot = value;
                }
            }
        }
    }

    /// Parses and bounds-checks a numeric cell. Blank text is missing
    /// without a warning.
    fn coerce<T>(
        &self,
        index: usize,
        field: StatField,
        raw: &str,
        parse: fn(&str) -> Option<T>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Option<T>
    where
        T: Copy + Into<f64>,
    {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let mut warn = |issue| {
            diagnostics.push(Diagnostic::FieldParse {
                row: index,
                field,
                raw: trimmed.to_owned(),
                issue,
            });
        };

        let Some(value) = parse(trimmed) else {
            warn(FieldIssue::NotNumeric);
            return None;
        };

        if let Some(bounds) = self.schema.bounds_for(field)
            && !bounds.contains(value.into(), self.schema.epsilon_for(field))
        {
            warn(FieldIssue::OutOfBounds {
                min: bounds.min,
                max: bounds.max,
            });
            return None;
        }

        Some(value)
    }
}
