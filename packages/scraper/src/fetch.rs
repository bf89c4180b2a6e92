//! [`PageFetcher`] implementations.
//!
//! One request per run: there is no retry loop, a failed fetch ends the run.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::{PageFetcher, RawPage, ScrapeError};

/// Default per-request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User agent sent with every request. Sports-reference rejects some
/// default library agents.
const USER_AGENT: &str = concat!("nba_stats_ingest/", env!("CARGO_PKG_VERSION"));

/// Fetches pages over HTTP with a single GET.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    headers: BTreeMap<String, String>,
    timeout: Duration,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFetcher {
    /// Creates a fetcher with the default timeout and no extra headers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            headers: BTreeMap::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Adds an HTTP header to include in the request.
    #[must_use]
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_owned(), value.to_owned());
        self
    }

    /// Overrides the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds a [`reqwest::Client`] with the configured headers.
    fn build_client(&self) -> Result<reqwest::Client, ScrapeError> {
        let mut header_map = reqwest::header::HeaderMap::new();
        for (key, value) in &self.headers {
            let name = reqwest::header::HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| ScrapeError::Parse(format!("invalid header name '{key}': {e}")))?;
            let val = reqwest::header::HeaderValue::from_str(value).map_err(|e| {
                ScrapeError::Parse(format!("invalid header value '{value}': {e}"))
            })?;
            header_map.insert(name, val);
        }
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(header_map)
            .timeout(self.timeout)
            .build()
            .map_err(ScrapeError::Http)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError> {
        let client = self.build_client()?;

        log::info!("Fetching {url}");
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        // `text()` decodes using the `Content-Type` charset (the `charset`
        // feature), falling back to UTF-8.
        let body = response.text().await?;
        log::debug!("Fetched {} bytes from {url}", body.len());

        Ok(RawPage {
            url: url.to_owned(),
            body,
        })
    }

    fn strategy(&self) -> &'static str {
        "http"
    }
}

/// Reads a previously saved page from disk instead of the network.
///
/// The `url` passed to [`PageFetcher::fetch`] is only used for reporting.
#[derive(Debug, Clone)]
pub struct FileFetcher {
    path: PathBuf,
}

impl FileFetcher {
    /// Creates a fetcher that always returns the contents of `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PageFetcher for FileFetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError> {
        log::info!("Reading {} (in place of {url})", self.path.display());
        let bytes = tokio::fs::read(&self.path).await?;

        // Saved pages are expected to be UTF-8; stray bytes become U+FFFD
        // rather than failing the whole run.
        let body = String::from_utf8_lossy(&bytes).into_owned();

        Ok(RawPage {
            url: self.path.display().to_string(),
            body,
        })
    }

    fn strategy(&self) -> &'static str {
        "file"
    }
}

/// Either fetcher, chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum Fetcher {
    /// Live HTTP request.
    Http(HttpFetcher),
    /// Saved page on disk.
    File(FileFetcher),
}

impl Fetcher {
    /// Uses `input` when given, otherwise fetches over HTTP.
    #[must_use]
    pub fn from_input(input: Option<PathBuf>) -> Self {
        input.map_or_else(
            || Self::Http(HttpFetcher::new()),
            |path| Self::File(FileFetcher::new(path)),
        )
    }
}

impl PageFetcher for Fetcher {
    async fn fetch(&self, url: &str) -> Result<RawPage, ScrapeError> {
        match self {
            Self::Http(fetcher) => fetcher.fetch(url).await,
            Self::File(fetcher) => fetcher.fetch(url).await,
        }
    }

    fn strategy(&self) -> &str {
        match self {
            Self::Http(fetcher) => fetcher.strategy(),
            Self::File(fetcher) => fetcher.strategy(),
        }
    }
}
