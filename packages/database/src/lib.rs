#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Snapshot storage for normalized player stats.
//!
//! Records are written through the [`RecordSink`] trait. The provided
//! implementation, [`player_stats_db::DuckDbSink`], stores them in a local
//! `DuckDB` file or, through `DuckDB`'s `mysql` extension, in a MySQL
//! database described by [`db::Credentials`]. Every load replaces the whole
//! destination table; a failed load leaves the previous snapshot in place.

pub mod db;
pub mod paths;
pub mod player_stats_db;

use nba_stats_models::PlayerStatRecord;

/// Errors that can occur while loading records.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// `DuckDB` (or an attached catalog) rejected a statement.
    #[error("DuckDB error: {0}")]
    DuckDb(#[from] duckdb::Error),

    /// Creating the database directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A table name can't be used as a SQL identifier.
    #[error("Invalid table name {name:?}")]
    InvalidIdentifier {
        /// Rejected name.
        name: String,
    },

    /// Connection settings from the environment are unusable.
    #[error("Invalid database configuration: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

/// Destination for a full snapshot of normalized records.
pub trait RecordSink {
    /// Replaces the contents of `table` with `records`.
    ///
    /// Either every record is stored or the previous contents remain.
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the table name is invalid or any statement
    /// fails.
    fn replace_all(&mut self, table: &str, records: &[PlayerStatRecord]) -> Result<u64, DbError>;

    /// Describes where `table` lives, for run summaries.
    fn location(&self, table: &str) -> String;
}

/// Checks that `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`,
/// at most 64 bytes so MySQL accepts it too).
///
/// # Errors
///
/// Returns [`DbError::InvalidIdentifier`] otherwise.
pub fn validate_identifier(name: &str) -> Result<(), DbError> {
    let mut chars = name.chars();
    let valid = name.len() <= 64
        && chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidIdentifier {
            name: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        for name in ["player_stats", "_scratch", "PlayerStats2024"] {
            assert!(validate_identifier(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        let long = "a".repeat(65);
        for name in ["", "2024_stats", "player stats", "stats;DROP", "dest.stats", &long] {
            assert!(
                matches!(validate_identifier(name), Err(DbError::InvalidIdentifier { .. })),
                "{name}"
            );
        }
    }
}
