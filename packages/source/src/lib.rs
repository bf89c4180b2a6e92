#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Table schema registry and row normalization.
//!
//! [`registry`] loads the embedded [`nba_stats_models::TableSchema`]
//! definitions and
//! [`normalize`] turns extracted [`nba_stats_models::RawRow`]s into typed
//! [`nba_stats_models::PlayerStatRecord`]s under a given schema.

pub mod normalize;
pub mod parsing;
pub mod registry;
pub mod text;

use nba_stats_models::InvalidSchemaError;

/// Errors that can occur while loading table schemas.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A schema file isn't valid TOML or has the wrong shape.
    #[error("Failed to parse schema {name}: {source}")]
    Toml {
        /// Schema file name.
        name: String,
        /// Underlying parse error.
        source: toml::de::Error,
    },

    /// A schema parsed but is internally inconsistent.
    #[error(transparent)]
    Invalid(#[from] InvalidSchemaError),

    /// No schema with the requested id exists.
    #[error("Unknown schema: {id}")]
    Unknown {
        /// Requested id.
        id: String,
    },
}
