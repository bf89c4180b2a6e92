#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Scrapes one per-game stats table and replaces a database snapshot with it.
//!
//! A run is a single forward pass: fetch the page, extract the table (from
//! the document or an HTML comment), normalize its rows, and hand the
//! records to a [`RecordSink`]. Fetching is the only suspension point; the
//! parsed document is dropped before anything is written.

pub mod export;

use std::fmt;

use nba_stats_database::{DbError, RecordSink};
use nba_stats_models::{Diagnostic, PlayerStatRecord, TableSchema};
use nba_stats_scraper::html_table::{TableLocation, extract_table};
use nba_stats_scraper::{PageFetcher, RawPage, ScrapeError};
use nba_stats_source::SchemaError;
use nba_stats_source::normalize::Normalizer;

use crate::export::ExportError;

/// Season scraped when none is given.
pub const DEFAULT_SEASON: u16 = 2024;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The page couldn't be retrieved.
    #[error("Failed to fetch {url}: {source}")]
    FetchFailure {
        /// Requested URL or file.
        url: String,
        /// Underlying fetch error.
        source: ScrapeError,
    },

    /// The target table is in neither the document nor its comments.
    #[error("Table '{table_id}' not found in {url}")]
    TableNotFound {
        /// `id` that was searched for.
        table_id: String,
        /// Page that was searched.
        url: String,
    },

    /// The table was found but can't be read.
    #[error("Failed to extract table from {url}: {source}")]
    Extract {
        /// Page the table came from.
        url: String,
        /// Underlying extraction error.
        source: ScrapeError,
    },

    /// Writing to the destination failed; the previous snapshot is intact.
    #[error("Failed to load {table}: {source}")]
    LoadFailure {
        /// Destination table.
        table: String,
        /// Underlying database error.
        source: DbError,
    },

    /// Writing an export file failed.
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),

    /// Schema lookup or parsing failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// No URL was given and the schema has no URL template.
    #[error("Schema '{schema_id}' has no URL template; pass --url or --input")]
    MissingUrl {
        /// Schema that lacks a template.
        schema_id: String,
    },
}

/// Records extracted and normalized from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Collected {
    /// Where the page was read from.
    pub source: String,
    /// Where the table was found in the page.
    pub location: TableLocation,
    /// Header labels of the located table.
    pub headers: Vec<String>,
    /// One record per data row, in page order.
    pub records: Vec<PlayerStatRecord>,
    /// Row-local warnings.
    pub warnings: Vec<Diagnostic>,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Where the page was read from.
    pub source: String,
    /// Where the table was found in the page.
    pub location: TableLocation,
    /// Number of normalized records.
    pub records: usize,
    /// Rows written and where, or `None` if nothing was loaded.
    pub loaded: Option<(u64, String)>,
    /// Row-local warnings.
    pub warnings: Vec<Diagnostic>,
}

impl RunSummary {
    fn new(collected: Collected, loaded: Option<(u64, String)>) -> Self {
        Self {
            source: collected.source,
            location: collected.location,
            records: collected.records.len(),
            loaded,
            warnings: collected.warnings,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} warnings, table found in {} of {}",
            self.records,
            self.warnings.len(),
            self.location,
            self.source
        )?;
        match &self.loaded {
            Some((rows, destination)) => write!(f, "; loaded {rows} rows into {destination}"),
            None => f.write_str("; nothing loaded"),
        }
    }
}

/// Returns `url` if given, otherwise the schema's page URL for `season`.
///
/// # Errors
///
/// Returns [`IngestError::MissingUrl`] if neither is available.
pub fn resolve_url(
    schema: &TableSchema,
    season: u16,
    url: Option<String>,
) -> Result<String, IngestError> {
    url.or_else(|| schema.url_for_season(season))
        .ok_or_else(|| IngestError::MissingUrl {
            schema_id: schema.id.clone(),
        })
}

/// Fetches `url` and returns its normalized records without storing them.
///
/// # Errors
///
/// Returns [`IngestError::FetchFailure`] if the page can't be retrieved,
/// [`IngestError::TableNotFound`] if the table is missing, or
/// [`IngestError::Extract`] if the table has no usable header.
pub async fn collect<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    schema: &TableSchema,
) -> Result<Collected, IngestError> {
    log::info!("Fetching {url} ({})", fetcher.strategy());
    let page = fetcher
        .fetch(url)
        .await
        .map_err(|source| IngestError::FetchFailure {
            url: url.to_owned(),
            source,
        })?;

    extract_and_normalize(&page, schema)
}

/// Runs the whole pipeline and replaces `table` in `sink`.
///
/// Nothing is written unless the page was fetched and the table found.
///
/// # Errors
///
/// Returns the [`collect`] errors, or [`IngestError::LoadFailure`] if the
/// sink rejects the snapshot.
pub async fn run<F: PageFetcher, S: RecordSink>(
    fetcher: &F,
    sink: &mut S,
    url: &str,
    schema: &TableSchema,
    table: &str,
) -> Result<RunSummary, IngestError> {
    let collected = collect(fetcher, url, schema).await?;

    log::info!("Loading {} records into {table}", collected.records.len());
    let written = sink
        .replace_all(table, &collected.records)
        .map_err(|source| IngestError::LoadFailure {
            table: table.to_owned(),
            source,
        })?;

    let destination = sink.location(table);
    Ok(RunSummary::new(collected, Some((written, destination))))
}

/// Runs fetch, extraction and normalization only.
///
/// # Errors
///
/// Returns the same errors as [`collect`].
pub async fn dry_run<F: PageFetcher>(
    fetcher: &F,
    url: &str,
    schema: &TableSchema,
) -> Result<RunSummary, IngestError> {
    let collected = collect(fetcher, url, schema).await?;
    Ok(RunSummary::new(collected, None))
}

/// Synchronous so the parsed document never lives across an `.await`.
fn extract_and_normalize(page: &RawPage, schema: &TableSchema) -> Result<Collected, IngestError> {
    let table = extract_table(&page.body, schema).map_err(|e| match e {
        ScrapeError::TableNotFound { table_id } => IngestError::TableNotFound {
            table_id,
            url: page.url.clone(),
        },
        source => IngestError::Extract {
            url: page.url.clone(),
            source,
        },
    })?;

    let normalized = Normalizer::new(schema).normalize(table.rows());

    for warning in &normalized.diagnostics {
        log::warn!("{warning}");
    }
    log::info!(
        "Normalized {} rows from {} ({} warnings)",
        normalized.records.len(),
        table.location(),
        normalized.diagnostics.len()
    );

    Ok(Collected {
        source: page.url.clone(),
        location: table.location(),
        headers: table.headers().to_vec(),
        records: normalized.records,
        warnings: normalized.diagnostics,
    })
}
