//! Destination selection from the environment.

use std::fmt;
use std::path::PathBuf;

use crate::DbError;
use crate::player_stats_db::DuckDbSink;

/// Environment variable overriding the default `DuckDB` file.
pub const DUCKDB_PATH_VAR: &str = "NBA_STATS_DUCKDB";

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_MYSQL_USER: &str = "root";
const DEFAULT_MYSQL_DATABASE: &str = "nba_stats";

/// MySQL connection bundle.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Account name.
    pub user: String,
    /// Account password (may be empty).
    pub password: String,
    /// Database (schema) name.
    pub database: String,
}

// Keeps the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl Credentials {
    /// Reads `DB_HOST`, `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
    ///
    /// Returns `Ok(None)` when `DB_HOST` is unset.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if `DB_PORT` is not a valid port.
    pub fn from_env() -> Result<Option<Self>, DbError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, DbError> {
        let Some(host) = lookup("DB_HOST").filter(|h| !h.trim().is_empty()) else {
            return Ok(None);
        };

        let port = match lookup("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| DbError::Config {
                message: format!("DB_PORT {raw:?}: {e}"),
            })?,
            None => DEFAULT_MYSQL_PORT,
        };

        Ok(Some(Self {
            host,
            port,
            user: lookup("DB_USER").unwrap_or_else(|| DEFAULT_MYSQL_USER.to_string()),
            password: lookup("DB_PASSWORD").unwrap_or_default(),
            database: lookup("DB_NAME").unwrap_or_else(|| DEFAULT_MYSQL_DATABASE.to_string()),
        }))
    }

    /// Connection URL without the password, for logs and summaries.
    #[must_use]
    pub fn display_url(&self) -> String {
        format!(
            "mysql://{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }

    /// Builds a `CREATE SECRET` statement holding these credentials, for
    /// `ATTACH '' AS ... (TYPE mysql, SECRET <name>)`.
    ///
    /// Each value is its own SQL string literal, so spaces and quotes in a
    /// user or password survive intact. `name` must be a plain identifier.
    #[must_use]
    pub fn secret_sql(&self, name: &str) -> String {
        format!(
            "CREATE OR REPLACE TEMPORARY SECRET {name} (
                TYPE mysql,
                HOST {},
                PORT {},
                USER {},
                PASSWORD {},
                DATABASE {}
            )",
            sql_literal(&self.host),
            self.port,
            sql_literal(&self.user),
            sql_literal(&self.password),
            sql_literal(&self.database)
        )
    }
}

fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Where a run's records are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A local `DuckDB` file.
    DuckDb(PathBuf),
    /// A MySQL database reached through `DuckDB`'s `mysql` extension.
    MySql(Credentials),
}

impl Destination {
    /// Picks the destination: MySQL when `DB_HOST` is set, otherwise the
    /// `DuckDB` file from `duckdb_path`, `NBA_STATS_DUCKDB`, or the default
    /// path, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the MySQL settings are invalid.
    pub fn from_env(duckdb_path: Option<PathBuf>) -> Result<Self, DbError> {
        if let Some(credentials) = Credentials::from_env()? {
            return Ok(Self::MySql(credentials));
        }

        let path = duckdb_path
            .or_else(|| std::env::var_os(DUCKDB_PATH_VAR).map(PathBuf::from))
            .unwrap_or_else(crate::paths::default_duckdb_path);

        Ok(Self::DuckDb(path))
    }

    /// Opens a sink for this destination.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database can't be opened or attached.
    pub fn open(&self) -> Result<DuckDbSink, DbError> {
        match self {
            Self::DuckDb(path) => DuckDbSink::open(path),
            Self::MySql(credentials) => DuckDbSink::attach_mysql(credentials),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuckDb(path) => write!(f, "duckdb:{}", path.display()),
            Self::MySql(credentials) => f.write_str(&credentials.display_url()),
        }
    }
}
