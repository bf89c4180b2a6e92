//! Static table schema configuration.
//!
//! A [`TableSchema`] says which HTML table to look for, how its column
//! labels map onto [`StatField`]s, and which numeric bounds each field must
//! respect. Schemas are plain values deserialized from TOML and handed to
//! the extractor and normalizer explicitly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FieldKind, StatField};

/// Maps one raw column label onto a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    /// Header text exactly as it appears in the source table (e.g. `"3P%"`).
    pub label: String,
    /// Field the column is stored as.
    pub field: StatField,
}

/// Inclusive numeric bounds for a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldBounds {
    /// Smallest accepted value.
    #[serde(default)]
    pub min: Option<f64>,
    /// Largest accepted value.
    #[serde(default)]
    pub max: Option<f64>,
}

impl FieldBounds {
    /// Bounds applied to percentage fields without explicit configuration.
    pub const UNIT_INTERVAL: Self = Self {
        min: Some(0.0),
        max: Some(1.0),
    };

    /// Returns whether `value` lies within the bounds widened by `epsilon`.
    #[must_use]
    pub fn contains(&self, value: f64, epsilon: f64) -> bool {
        self.min.is_none_or(|min| value >= min - epsilon)
            && self.max.is_none_or(|max| value <= max + epsilon)
    }
}

/// Describes the target table and how to map and validate its columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Unique identifier (e.g. `"nba_per_game"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// `id` attribute of the `<table>` element.
    pub table_id: String,
    /// Page URL with a `{season}` placeholder.
    #[serde(default)]
    pub url_template: Option<String>,
    /// Default destination relation.
    pub destination: String,
    /// First-cell text that marks a repeated header row inside `<tbody>`.
    #[serde(default = "default_header_repeat_label")]
    pub header_repeat_label: String,
    /// When set, a table without the expected id is still accepted if at
    /// least this many of its header labels are known columns.
    #[serde(default)]
    pub min_matching_columns: Option<usize>,
    /// Slack allowed around percentage bounds.
    #[serde(default = "default_percentage_epsilon")]
    pub percentage_epsilon: f64,
    /// Ordered column mappings. Several labels may map to one field when
    /// the source renamed a column between seasons.
    pub columns: Vec<ColumnMapping>,
    /// Explicit per-field bounds.
    #[serde(default)]
    pub bounds: BTreeMap<StatField, FieldBounds>,
}

fn default_header_repeat_label() -> String {
    "Rk".to_string()
}

const fn default_percentage_epsilon() -> f64 {
    0.001
}

impl TableSchema {
    /// Returns the field a raw label maps to, if any.
    #[must_use]
    pub fn field_for_label(&self, label: &str) -> Option<StatField> {
        self.columns
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.field)
    }

    /// Returns the bounds for `field`. Percentage fields fall back to
    /// `[0, 1]`; other fields are unbounded unless configured.
    #[must_use]
    pub fn bounds_for(&self, field: StatField) -> Option<FieldBounds> {
        self.bounds.get(&field).copied().or_else(|| {
            (field.kind() == FieldKind::Percentage).then_some(FieldBounds::UNIT_INTERVAL)
        })
    }

    /// Returns the tolerance used when checking `field` against its bounds.
    #[must_use]
    pub fn epsilon_for(&self, field: StatField) -> f64 {
        if field.kind() == FieldKind::Percentage {
            self.percentage_epsilon
        } else {
            0.0
        }
    }

    /// Builds the page URL for a season (the year the season ends in).
    #[must_use]
    pub fn url_for_season(&self, season: u16) -> Option<String> {
        self.url_template
            .as_ref()
            .map(|t| t.replace("{season}", &season.to_string()))
    }

    /// Checks the schema for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidSchemaError`] if the schema has no columns, repeats
    /// a label, or has an inverted or non-finite bound.
    pub fn validate(&self) -> Result<(), InvalidSchemaError> {
        if self.table_id.trim().is_empty() {
            return Err(self.invalid("table_id is empty".to_string()));
        }
        if self.columns.is_empty() {
            return Err(self.invalid("no columns configured".to_string()));
        }
        for (i, column) in self.columns.iter().enumerate() {
            if self.columns[..i].iter().any(|c| c.label == column.label) {
                return Err(self.invalid(format!("duplicate column label {:?}", column.label)));
            }
        }
        for (field, bounds) in &self.bounds {
            if !field.kind().is_numeric() {
                return Err(self.invalid(format!("bounds configured for text field {field}")));
            }
            if bounds.min.is_some_and(|v| !v.is_finite())
                || bounds.max.is_some_and(|v| !v.is_finite())
            {
                return Err(self.invalid(format!("non-finite bound for {field}")));
            }
            if let (Some(min), Some(max)) = (bounds.min, bounds.max)
                && min > max
            {
                return Err(self.invalid(format!("min {min} > max {max} for {field}")));
            }
        }
        if !(self.percentage_epsilon.is_finite() && self.percentage_epsilon >= 0.0) {
            return Err(self.invalid("percentage_epsilon must be >= 0".to_string()));
        }
        Ok(())
    }

    fn invalid(&self, message: String) -> InvalidSchemaError {
        InvalidSchemaError {
            schema_id: self.id.clone(),
            message,
        }
    }
}

/// Error returned when a [`TableSchema`] is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidSchemaError {
    /// Offending schema id.
    pub schema_id: String,
    /// What is wrong with it.
    pub message: String,
}

impl std::fmt::Display for InvalidSchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid schema {}: {}", self.schema_id, self.message)
    }
}

impl std::error::Error for InvalidSchemaError {}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
        id = "test"
        name = "Test"
        table_id = "per_game_stats"
        url_template = "https://example.com/NBA_{season}_per_game.html"
        destination = "player_stats"

        [[columns]]
        label = "Player"
        field = "player"

        [[columns]]
        label = "Tm"
        field = "team"

        [[columns]]
        label = "Team"
        field = "team"

        [[columns]]
        label = "FG%"
        field = "field_goal_pct"

        [bounds.age]
        min = 15
        max = 50
    "#;

    fn schema() -> TableSchema {
        toml::from_str(SCHEMA).unwrap()
    }

    #[test]
    fn parses_with_defaults() {
        let schema = schema();
        assert_eq!(schema.header_repeat_label, "Rk");
        assert!((schema.percentage_epsilon - 0.001).abs() < f64::EPSILON);
        assert_eq!(schema.min_matching_columns, None);
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn several_labels_map_to_one_field() {
        let schema = schema();
        assert_eq!(schema.field_for_label("Tm"), Some(StatField::Team));
        assert_eq!(schema.field_for_label("Team"), Some(StatField::Team));
        assert_eq!(schema.field_for_label("Awards"), None);
    }

    #[test]
    fn percentages_default_to_unit_interval() {
        let schema = schema();
        assert_eq!(
            schema.bounds_for(StatField::FreeThrowPct),
            Some(FieldBounds::UNIT_INTERVAL)
        );
        assert_eq!(schema.bounds_for(StatField::PointsPerGame), None);
        assert_eq!(
            schema.bounds_for(StatField::Age),
            Some(FieldBounds {
                min: Some(15.0),
                max: Some(50.0)
            })
        );
    }

    #[test]
    fn bounds_respect_epsilon() {
        let b = FieldBounds::UNIT_INTERVAL;
        assert!(b.contains(1.0005, 0.001));
        assert!(!b.contains(1.2, 0.001));
        assert!(!b.contains(-0.1, 0.001));
    }

    #[test]
    fn builds_season_url() {
        assert_eq!(
            schema().url_for_season(2024).as_deref(),
            Some("https://example.com/NBA_2024_per_game.html")
        );
    }

    #[test]
    fn rejects_duplicate_labels() {
        let mut schema = schema();
        schema.columns.push(ColumnMapping {
            label: "Player".to_string(),
            field: StatField::Player,
        });
        let err = schema.validate().unwrap_err();
        assert!(err.message.contains("duplicate"));
    }

    #[test]
    fn rejects_inverted_bounds() {
        let mut schema = schema();
        schema.bounds.insert(
            StatField::GamesPlayed,
            FieldBounds {
                min: Some(90.0),
                max: Some(0.0),
            },
        );
        assert!(schema.validate().is_err());
    }
}
