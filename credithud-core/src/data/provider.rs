//! Source fetcher trait and structured error types.
//!
//! The SourceFetcher trait abstracts over where a CSV export lives (HTTP,
//! local file) so the pipeline can swap implementations and mock for tests.

use super::table::Table;
use std::path::PathBuf;
use thiserror::Error;

/// Structured error types for source fetches.
///
/// Every variant is fatal to a render cycle; callers surface the message
/// and show no partial dashboard.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} fetching {url}")]
    HttpStatus { status: u16, url: String },

    #[error("malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid source location: {0}")]
    InvalidLocation(String),
}

/// Where a table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Http,
    File,
}

/// Trait for table sources.
///
/// A fetch is a single attempt with no retries and no side effect beyond
/// the read. Memoization lives above this trait in `SourceCache`.
pub trait SourceFetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Retrieve and parse the table at `location`.
    fn fetch(&self, location: &str) -> Result<Table, SourceError>;
}
