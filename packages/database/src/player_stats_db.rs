//! `DuckDB` snapshot storage for player stat records.
//!
//! A local database gets the records table plus a `_meta` key/value table
//! tracking the last load. When another database is attached, rows are
//! written to a `<table>__staging` relation and swapped in once every
//! insert has succeeded. The swap never leaves the catalog without the
//! table: MySQL renames both tables in one `RENAME TABLE`, and an attached
//! `DuckDB` catalog drops and renames inside one transaction.

use std::path::Path;

use duckdb::Connection;
use nba_stats_models::{FieldKind, FieldValue, PlayerStatRecord, StatField};

use crate::db::Credentials;
use crate::{DbError, RecordSink, validate_identifier};

/// Number of records per INSERT statement.
const CHUNK_SIZE: usize = 1_000;

/// Catalog name used for an attached MySQL database.
const ATTACHED_CATALOG: &str = "dest";

/// Session-scoped secret holding the MySQL credentials.
const MYSQL_SECRET: &str = "nba_stats_mysql";

const STAGING_SUFFIX: &str = "__staging";
/// Suffix the old MySQL table is renamed to during a swap.
const PREVIOUS_SUFFIX: &str = "__previous";

/// `_meta` key: URL or file the last snapshot was read from.
pub const META_SOURCE_URL: &str = "last_source_url";
/// `_meta` key: RFC 3339 timestamp of the last successful load.
pub const META_LOADED_AT: &str = "last_loaded_at";
/// `_meta` key: number of rows in the last snapshot.
pub const META_RECORD_COUNT: &str = "last_record_count";
/// `_meta` key: table the last snapshot was written to.
pub const META_TABLE: &str = "last_table";

/// Engine behind an attached catalog, which decides how the staging table
/// is swapped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CatalogKind {
    DuckDb,
    MySql,
}

#[derive(Debug, Clone)]
struct Catalog {
    name: String,
    kind: CatalogKind,
}

/// [`RecordSink`] backed by a `DuckDB` connection.
pub struct DuckDbSink {
    conn: Connection,
    catalog: Option<Catalog>,
    label: String,
    source_url: Option<String>,
}

impl std::fmt::Debug for DuckDbSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbSink")
            .field("catalog", &self.catalog)
            .field("label", &self.label)
            .field("source_url", &self.source_url)
            .finish_non_exhaustive()
    }
}

impl DuckDbSink {
    /// Opens (or creates) a `DuckDB` file, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the directory or database can't be created.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        if let Some(parent) = path.parent() {
            crate::paths::ensure_dir(parent)?;
        }

        let conn = Connection::open(path)?;
        create_meta_table(&conn)?;
        log::debug!("Opened {}", path.display());

        Ok(Self {
            conn,
            catalog: None,
            label: path.display().to_string(),
            source_url: None,
        })
    }

    /// Opens a throwaway in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if `DuckDB` fails to initialize.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        create_meta_table(&conn)?;

        Ok(Self {
            conn,
            catalog: None,
            label: ":memory:".to_string(),
            source_url: None,
        })
    }

    /// Attaches a MySQL database through `DuckDB`'s `mysql` extension.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the extension can't be loaded or the server
    /// refuses the connection.
    pub fn attach_mysql(credentials: &Credentials) -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("INSTALL mysql; LOAD mysql;")?;
        conn.execute_batch(&credentials.secret_sql(MYSQL_SECRET))?;
        conn.execute_batch(&format!(
            "ATTACH '' AS {ATTACHED_CATALOG} (TYPE mysql, SECRET {MYSQL_SECRET})"
        ))?;
        log::info!("Attached {}", credentials.display_url());

        Ok(Self::with_catalog(
            conn,
            ATTACHED_CATALOG,
            CatalogKind::MySql,
            credentials.display_url(),
        ))
    }

    /// Wraps a connection that already has `catalog` attached.
    fn with_catalog(conn: Connection, catalog: &str, kind: CatalogKind, label: String) -> Self {
        Self {
            conn,
            catalog: Some(Catalog {
                name: catalog.to_owned(),
                kind,
            }),
            label,
            source_url: None,
        }
    }

    /// Records where the next snapshot comes from (stored in `_meta`).
    #[must_use]
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }

    fn replace_local(&mut self, table: &str, records: &[PlayerStatRecord]) -> Result<u64, DbError> {
        let target = quote_ident(table);

        // Dropping the transaction without commit rolls it back.
        let tx = self.conn.transaction()?;
        tx.execute_batch(&create_table_sql("CREATE OR REPLACE TABLE", &target))?;
        let written = insert_records(&tx, &target, records)?;

        set_meta(&tx, META_TABLE, table)?;
        set_meta(&tx, META_RECORD_COUNT, &written.to_string())?;
        set_meta(&tx, META_LOADED_AT, &chrono::Utc::now().to_rfc3339())?;
        if let Some(url) = &self.source_url {
            set_meta(&tx, META_SOURCE_URL, url)?;
        }
        tx.commit()?;

        Ok(written)
    }
}

impl RecordSink for DuckDbSink {
    fn replace_all(&mut self, table: &str, records: &[PlayerStatRecord]) -> Result<u64, DbError> {
        validate_identifier(table)?;

        let written = match self.catalog.clone() {
            None => self.replace_local(table, records)?,
            Some(catalog) => replace_attached(&mut self.conn, &catalog, table, records)?,
        };

        log::info!("Replaced {} with {written} rows", self.location(table));
        Ok(written)
    }

    fn location(&self, table: &str) -> String {
        format!("{}#{table}", self.label)
    }
}

/// Writes into a staging table in `catalog`, then swaps it in for `table`.
///
/// On any failure the staging table is dropped and `table` keeps its
/// previous contents.
fn replace_attached(
    conn: &mut Connection,
    catalog: &Catalog,
    table: &str,
    records: &[PlayerStatRecord],
) -> Result<u64, DbError> {
    let staging_name = format!("{table}{STAGING_SUFFIX}");
    validate_identifier(&staging_name)?;
    validate_identifier(&format!("{table}{PREVIOUS_SUFFIX}"))?;
    let staging = format!("{}.{}", catalog.name, quote_ident(&staging_name));

    conn.execute_batch(&format!("DROP TABLE IF EXISTS {staging};"))?;
    conn.execute_batch(&create_table_sql("CREATE TABLE", &staging))?;

    let result = insert_records(conn, &staging, records)
        .and_then(|written| swap_in(conn, catalog, table).map(|()| written));

    if result.is_err() {
        drop_quietly(conn, &staging);
    }

    result
}

/// Replaces `table` in `catalog` with its filled staging table.
fn swap_in(conn: &mut Connection, catalog: &Catalog, table: &str) -> Result<(), DbError> {
    match catalog.kind {
        CatalogKind::DuckDb => {
            let target = format!("{}.{}", catalog.name, quote_ident(table));
            let staging = format!(
                "{}.{}",
                catalog.name,
                quote_ident(&format!("{table}{STAGING_SUFFIX}"))
            );

            let tx = conn.transaction()?;
            tx.execute_batch(&format!("DROP TABLE IF EXISTS {target};"))?;
            tx.execute_batch(&format!(
                "ALTER TABLE {staging} RENAME TO {};",
                quote_ident(table)
            ))?;
            tx.commit()?;
            Ok(())
        }
        CatalogKind::MySql => swap_in_mysql(conn, &catalog.name, table),
    }
}

/// MySQL commits DDL immediately, so the swap is a single multi-table
/// `RENAME TABLE`, which MySQL applies atomically.
fn swap_in_mysql(conn: &Connection, catalog: &str, table: &str) -> Result<(), DbError> {
    let staging = format!("{table}{STAGING_SUFFIX}");
    let previous = format!("{table}{PREVIOUS_SUFFIX}");

    mysql_execute(conn, catalog, &format!("DROP TABLE IF EXISTS `{previous}`"))?;
    if table_exists(conn, catalog, table)? {
        mysql_execute(
            conn,
            catalog,
            &format!("RENAME TABLE `{table}` TO `{previous}`, `{staging}` TO `{table}`"),
        )?;
    } else {
        mysql_execute(conn, catalog, &format!("RENAME TABLE `{staging}` TO `{table}`"))?;
    }
    conn.execute_batch("CALL mysql_clear_cache();")?;

    if let Err(e) = mysql_execute(conn, catalog, &format!("DROP TABLE IF EXISTS `{previous}`")) {
        log::warn!("Failed to drop {catalog}.{previous}: {e}");
    }
    Ok(())
}

fn drop_quietly(conn: &Connection, target: &str) {
    if let Err(e) = conn.execute_batch(&format!("DROP TABLE IF EXISTS {target};")) {
        log::warn!("Failed to drop {target}: {e}");
    }
}

/// Runs `sql` directly on the MySQL server behind `catalog`. Callers only
/// pass validated identifiers, so `sql` never contains a quote.
fn mysql_execute(conn: &Connection, catalog: &str, sql: &str) -> Result<(), DbError> {
    conn.execute_batch(&format!("CALL mysql_execute('{catalog}', '{sql}');"))?;
    Ok(())
}

fn table_exists(conn: &Connection, catalog: &str, table: &str) -> Result<bool, DbError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM information_schema.tables
         WHERE table_catalog = ? AND table_name = ?",
        [catalog, table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

const fn sql_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "TEXT",
        FieldKind::Integer => "INTEGER",
        FieldKind::Float | FieldKind::Percentage => "DOUBLE",
    }
}

fn create_table_sql(verb: &str, target: &str) -> String {
    let columns = StatField::all()
        .iter()
        .map(|f| format!("{} {}", quote_ident(f.column_name()), sql_type(f.kind())))
        .collect::<Vec<_>>()
        .join(",\n    ");

    format!("{verb} {target} (\n    {columns}\n)")
}

/// Inserts records with chunked multi-row INSERTs. Missing values are
/// bound as `NULL`.
fn insert_records(
    conn: &Connection,
    target: &str,
    records: &[PlayerStatRecord],
) -> Result<u64, DbError> {
    let fields = StatField::all();
    let column_list = fields
        .iter()
        .map(|f| quote_ident(f.column_name()))
        .collect::<Vec<_>>()
        .join(", ");
    let row_placeholders = format!("({})", vec!["?"; fields.len()].join(", "));

    let mut total = 0u64;

    for chunk in records.chunks(CHUNK_SIZE) {
        let mut sql = format!("INSERT INTO {target} ({column_list}) VALUES ");
        for i in 0..chunk.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&row_placeholders);
        }

        let mut stmt = conn.prepare(&sql)?;
        let mut param_idx = 1usize;

        for record in chunk {
            for &field in fields {
                match record.value(field) {
                    FieldValue::Text(v) => stmt.raw_bind_parameter(param_idx, v)?,
                    FieldValue::Integer(v) => stmt.raw_bind_parameter(param_idx, v)?,
                    FieldValue::Float(v) => stmt.raw_bind_parameter(param_idx, v)?,
                }
                param_idx += 1;
            }
        }

        let rows = stmt.raw_execute()?;
        total += u64::try_from(rows).unwrap_or(0);
    }

    Ok(total)
}

fn create_meta_table(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );",
    )?;
    Ok(())
}

/// Gets a value from the `_meta` table.
///
/// # Errors
///
/// Returns [`DbError`] if the query fails.
pub fn get_meta(conn: &Connection, key: &str) -> Result<Option<String>, DbError> {
    let mut stmt = conn.prepare("SELECT value FROM _meta WHERE key = ?")?;
    match stmt.query_row([key], |row| row.get(0)) {
        Ok(v) => Ok(Some(v)),
        Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(DbError::DuckDb(e)),
    }
}

fn set_meta(conn: &Connection, key: &str, value: &str) -> Result<(), DbError> {
    conn.execute(
        "INSERT INTO _meta (key, value) VALUES (?, ?)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        duckdb::params![key, value],
    )?;
    Ok(())
}

/// Returns the number of rows in `table`.
///
/// # Errors
///
/// Returns [`DbError`] if the name is invalid or the query fails.
pub fn count_rows(conn: &Connection, table: &str) -> Result<u64, DbError> {
    validate_identifier(table)?;
    let mut stmt = conn.prepare(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))?;
    let count: i64 = stmt.query_row([], |row| row.get(0))?;
    Ok(u64::try_from(count).unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(player: &str, team: &str, age: Option<i32>, pts: Option<f64>) -> PlayerStatRecord {
        PlayerStatRecord {
            player: Some(player.to_string()),
            team: Some(team.to_string()),
            age,
            points_per_game: pts,
            ..PlayerStatRecord::default()
        }
    }

    #[test]
    fn second_replace_supersedes_first() {
        let mut sink = DuckDbSink::open_in_memory().unwrap();

        let first = [
            record("Precious Achiuwa", "TOT", Some(24), Some(7.6)),
            record("Precious Achiuwa", "TOR", Some(24), Some(6.8)),
        ];
        assert_eq!(sink.replace_all("player_stats", &first).unwrap(), 2);

        let second = [record("José Smith", "MIA", None, Some(18.4))];
        assert_eq!(sink.replace_all("player_stats", &second).unwrap(), 1);

        let conn = sink.connection();
        assert_eq!(count_rows(conn, "player_stats").unwrap(), 1);

        let (name, age, pts, fg_pct): (String, Option<i32>, Option<f64>, Option<f64>) = conn
            .query_row(
                "SELECT \"Player_Name\", \"Player_Age\", \"Points_Per_Game\", \"Field_Goal_Percentage\"
                 FROM player_stats",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(name, "José Smith");
        assert_eq!(age, None);
        assert_eq!(pts, Some(18.4));
        assert_eq!(fg_pct, None);
    }

    #[test]
    fn columns_use_external_names_and_types() {
        let mut sink = DuckDbSink::open_in_memory().unwrap();
        sink.replace_all("player_stats", &[]).unwrap();

        let column_type = |name: &str| -> String {
            sink.connection()
                .query_row(
                    "SELECT data_type FROM information_schema.columns
                     WHERE table_name = 'player_stats' AND column_name = ?",
                    [name],
                    |row| row.get(0),
                )
                .unwrap()
        };

        assert_eq!(column_type("Player_Name"), "VARCHAR");
        assert_eq!(column_type("Player_Age"), "INTEGER");
        assert_eq!(column_type("Points_Per_Game"), "DOUBLE");
        assert_eq!(column_type("Field_Goal_Percentage"), "DOUBLE");
    }

    #[test]
    fn records_load_metadata() {
        let mut sink = DuckDbSink::open_in_memory()
            .unwrap()
            .with_source_url("https://www.basketball-reference.com/leagues/NBA_2024_per_game.html");

        sink.replace_all(
            "player_stats",
            &[record("Bam Adebayo", "MIA", Some(26), Some(19.3))],
        )
        .unwrap();

        let conn = sink.connection();
        assert_eq!(get_meta(conn, META_RECORD_COUNT).unwrap().as_deref(), Some("1"));
        assert_eq!(get_meta(conn, META_TABLE).unwrap().as_deref(), Some("player_stats"));
        assert!(
            get_meta(conn, META_SOURCE_URL)
                .unwrap()
                .unwrap()
                .ends_with("NBA_2024_per_game.html")
        );
        let loaded_at = get_meta(conn, META_LOADED_AT).unwrap().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(&loaded_at).is_ok());
        assert_eq!(get_meta(conn, "missing_key").unwrap(), None);
    }

    #[test]
    fn invalid_table_name_writes_nothing() {
        let mut sink = DuckDbSink::open_in_memory().unwrap();
        let err = sink
            .replace_all("player_stats; DROP TABLE _meta", &[])
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidIdentifier { .. }));
        assert_eq!(get_meta(sink.connection(), META_RECORD_COUNT).unwrap(), None);
    }

    #[test]
    fn large_batches_span_chunks() {
        let mut sink = DuckDbSink::open_in_memory().unwrap();
        let records: Vec<_> = (0..(CHUNK_SIZE + 7))
            .map(|i| record(&format!("Player {i}"), "TOT", Some(20), None))
            .collect();

        let written = sink.replace_all("player_stats", &records).unwrap();
        assert_eq!(written, u64::try_from(records.len()).unwrap());
        assert_eq!(
            count_rows(sink.connection(), "player_stats").unwrap(),
            written
        );
    }

    #[test]
    fn attached_catalog_swaps_staging_table() {
        let mut sink = attached_sink();

        sink.replace_all(
            "player_stats",
            &[
                record("Ochai Agbaji", "TOT", Some(23), Some(4.4)),
                record("Ochai Agbaji", "UTA", Some(23), Some(5.0)),
            ],
        )
        .unwrap();
        sink.replace_all("player_stats", &[record("Ochai Agbaji", "TOR", Some(23), None)])
            .unwrap();

        let conn = sink.connection();
        assert_eq!(attached_count(conn, "player_stats"), 1);
        assert!(!table_exists(conn, "dest", "player_stats__staging").unwrap());
        assert_eq!(sink.location("player_stats"), "memory#player_stats");
    }

    fn attached_sink() -> DuckDbSink {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("ATTACH ':memory:' AS dest").unwrap();
        DuckDbSink::with_catalog(conn, "dest", CatalogKind::DuckDb, "memory".to_string())
    }

    fn attached_count(conn: &Connection, table: &str) -> i64 {
        conn.query_row(&format!("SELECT COUNT(*) FROM dest.{table}"), [], |row| {
            row.get(0)
        })
        .unwrap()
    }

    #[test]
    fn failed_local_replace_keeps_previous_snapshot() {
        let mut sink = DuckDbSink::open_in_memory().unwrap();
        sink.replace_all(
            "player_stats",
            &[
                record("Steven Adams", "HOU", Some(30), Some(8.6)),
                record("Bam Adebayo", "MIA", Some(26), Some(19.3)),
            ],
        )
        .unwrap();

        // Metadata writes happen last, after the table was already replaced.
        sink.connection().execute_batch("DROP TABLE _meta").unwrap();

        let err = sink
            .replace_all("player_stats", &[record("Ochai Agbaji", "TOR", Some(23), None)])
            .unwrap_err();
        assert!(matches!(err, DbError::DuckDb(_)), "{err}");
        assert_eq!(count_rows(sink.connection(), "player_stats").unwrap(), 2);
    }

    #[test]
    fn failed_rename_restores_attached_table() {
        let mut sink = attached_sink();
        sink.replace_all(
            "player_stats",
            &[
                record("Ochai Agbaji", "TOT", Some(23), Some(4.4)),
                record("Ochai Agbaji", "UTA", Some(23), Some(5.0)),
            ],
        )
        .unwrap();

        // No staging table exists, so the rename after the drop fails.
        let catalog = sink.catalog.clone().unwrap();
        assert!(swap_in(&mut sink.conn, &catalog, "player_stats").is_err());

        assert_eq!(attached_count(sink.connection(), "player_stats"), 2);
        assert!(!table_exists(sink.connection(), "dest", "player_stats__staging").unwrap());

        sink.replace_all("player_stats", &[record("Ochai Agbaji", "TOR", Some(23), None)])
            .unwrap();
        assert_eq!(attached_count(sink.connection(), "player_stats"), 1);
    }

    #[test]
    fn failed_attached_swap_drops_staging_and_keeps_target() {
        let mut sink = attached_sink();
        sink.connection()
            .execute_batch("CREATE VIEW dest.player_stats AS SELECT 42 AS answer")
            .unwrap();

        // `DROP TABLE` refuses to drop a view, so the swap fails after the
        // staging table was filled.
        let result = sink.replace_all(
            "player_stats",
            &[record("Ochai Agbaji", "TOR", Some(23), None)],
        );
        assert!(result.is_err());

        let conn = sink.connection();
        assert!(!table_exists(conn, "dest", "player_stats__staging").unwrap());
        let answer: i32 = conn
            .query_row("SELECT answer FROM dest.player_stats", [], |row| row.get(0))
            .unwrap();
        assert_eq!(answer, 42);
    }

    #[test]
    fn table_exists_is_scoped_to_catalog() {
        let sink = attached_sink();
        sink.connection()
            .execute_batch("CREATE TABLE player_stats (x INTEGER)")
            .unwrap();

        assert!(table_exists(sink.connection(), "memory", "player_stats").unwrap());
        assert!(!table_exists(sink.connection(), "dest", "player_stats").unwrap());
    }
}
