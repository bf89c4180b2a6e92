#![allow(clippy::module_name_repetitions)]
//! Default on-disk locations.
//!
//! Everything lives under the workspace's `data/` directory.

use std::path::{Path, PathBuf};

/// File name of the default `DuckDB` database.
const DEFAULT_DUCKDB_FILE: &str = "nba_stats.duckdb";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
///
/// # Panics
///
/// Panics if the workspace root cannot be resolved.
#[must_use]
pub fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .expect("Failed to find project root from CARGO_MANIFEST_DIR")
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the default `DuckDB` file used when no override is configured.
#[must_use]
pub fn default_duckdb_path() -> PathBuf {
    data_dir().join(DEFAULT_DUCKDB_FILE)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
