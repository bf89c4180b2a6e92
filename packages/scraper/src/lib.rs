#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page fetching and HTML table extraction for sports-reference stat pages.
//!
//! Provides the [`PageFetcher`] trait with an HTTP implementation
//! ([`fetch::HttpFetcher`]) and a saved-file implementation
//! ([`fetch::FileFetcher`]), plus [`html_table::extract_table`] which locates
//! the target table either directly in the document or inside an HTML
//! comment and yields its rows as [`nba_stats_models::RawRow`]s.
//!
//! This crate knows nothing about typed stats; it hands raw text onwards.

pub mod fetch;
pub mod html_table;

/// Errors that can occur while fetching or extracting a page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// Reading a saved page failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A selector or request header built from configuration was invalid.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The target table was in neither the document nor any comment.
    #[error("Table '{table_id}' not found in page or comments")]
    TableNotFound {
        /// `id` the extractor looked for.
        table_id: String,
    },

    /// The table was found but has no header cells.
    #[error("Table '{table_id}' has no header row")]
    MissingHeader {
        /// `id` of the located table.
        table_id: String,
    },
}

/// A fetched document, kept only until extraction finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPage {
    /// Where the page came from (URL or file path).
    pub url: String,
    /// Decoded document text.
    pub body: String,
}

/// Retrieves a page's text. No parsing happens here.
pub trait PageFetcher: Send + Sync {
    /// Fetches the page at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if the page cannot be retrieved.
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<RawPage, ScrapeError>> + Send;

    /// Returns a short name for log messages (e.g. `"http"`, `"file"`).
    fn strategy(&self) -> &str;
}
