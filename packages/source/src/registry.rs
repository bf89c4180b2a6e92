//! Table schemas embedded from TOML definitions.
//!
//! Each `.toml` file in `packages/source/schemas/` is baked into the binary
//! at compile time via [`include_str!`].

use nba_stats_models::TableSchema;

use crate::SchemaError;

/// Id of the schema used when none is requested.
pub const DEFAULT_SCHEMA_ID: &str = "nba_per_game";

/// TOML configs embedded at compile time.
const SCHEMA_TOMLS: &[(&str, &str)] = &[
    ("nba_per_game", include_str!("../schemas/nba_per_game.toml")),
    (
        "nba_playoffs_per_game",
        include_str!("../schemas/nba_playoffs_per_game.toml"),
    ),
];

/// Parses and validates a single schema definition.
///
/// # Errors
///
/// Returns [`SchemaError`] if the TOML is malformed or the schema fails
/// validation.
pub fn parse_schema_toml(name: &str, toml: &str) -> Result<TableSchema, SchemaError> {
    let schema: TableSchema = toml::from_str(toml).map_err(|source| SchemaError::Toml {
        name: name.to_owned(),
        source,
    })?;
    schema.validate()?;
    Ok(schema)
}

/// Returns every embedded schema.
///
/// # Errors
///
/// Returns the first [`SchemaError`] encountered.
pub fn all_schemas() -> Result<Vec<TableSchema>, SchemaError> {
    SCHEMA_TOMLS
        .iter()
        .map(|(name, toml)| parse_schema_toml(name, toml))
        .collect()
}

/// Returns the schema with the given id.
///
/// # Errors
///
/// Returns [`SchemaError::Unknown`] if no schema has that id, or a parse
/// error if the embedded definition is broken.
pub fn schema(id: &str) -> Result<TableSchema, SchemaError> {
    let schema = all_schemas()?
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| SchemaError::Unknown { id: id.to_owned() })?;
    log::debug!(
        "Using schema {id}: table '{}', {} column mappings",
        schema.table_id,
        schema.columns.len()
    );
    Ok(schema)
}

#[cfg(test)]
mod tests {
    use nba_stats_models::StatField;

    use super::*;

    #[test]
    fn loads_all_schemas() {
        let schemas = all_schemas().unwrap();
        assert_eq!(schemas.len(), SCHEMA_TOMLS.len());
    }

    #[test]
    fn schema_ids_match_file_names() {
        for (name, toml) in SCHEMA_TOMLS {
            let schema = parse_schema_toml(name, toml).unwrap();
            assert_eq!(&schema.id, name);
        }
    }

    #[test]
    fn default_schema_maps_every_field() {
        let schema = schema(DEFAULT_SCHEMA_ID).unwrap();
        for field in StatField::all() {
            assert!(
                schema.columns.iter().any(|c| c.field == *field),
                "{field} has no column"
            );
        }
        assert_eq!(schema.table_id, "per_game_stats");
        assert_eq!(schema.destination, "player_stats");
    }

    #[test]
    fn maps_both_team_labels() {
        let schema = schema(DEFAULT_SCHEMA_ID).unwrap();
        assert_eq!(schema.field_for_label("Tm"), Some(StatField::Team));
        assert_eq!(schema.field_for_label("Team"), Some(StatField::Team));
        assert_eq!(schema.field_for_label("Awards"), None);
    }

    #[test]
    fn unknown_schema_is_an_error() {
        assert!(matches!(
            schema("wnba_per_game"),
            Err(SchemaError::Unknown { .. })
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            parse_schema_toml("broken", "id = "),
            Err(SchemaError::Toml { .. })
        ));
    }
}
