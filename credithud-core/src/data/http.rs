//! HTTP(S) CSV fetcher.
//!
//! One GET per call; retries and refresh cadence belong to the caller.
//! Google Sheets editor links are rewritten to the CSV export endpoint
//! before the request goes out.

use super::csv_import::parse_csv;
use super::provider::{SourceError, SourceFetcher};
use super::sheets;
use super::table::Table;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches CSV exports over HTTP(S).
pub struct HttpCsvFetcher {
    client: reqwest::blocking::Client,
}

impl HttpCsvFetcher {
    pub fn new() -> Result<Self, SourceError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("credithud/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::NetworkUnreachable(format!("HTTP client setup: {e}")))?;
        Ok(Self { client })
    }

    /// Use a caller-built client (proxies, TLS roots, custom headers).
    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl SourceFetcher for HttpCsvFetcher {
    fn name(&self) -> &str {
        "http_csv"
    }

    fn fetch(&self, location: &str) -> Result<Table, SourceError> {
        let url = sheets::export_url(location);
        if url != location {
            tracing::debug!(%location, %url, "rewrote spreadsheet link to CSV export");
        }

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::HttpStatus {
                status: status.as_u16(),
                url,
            });
        }

        let is_html = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        if is_html {
            return Err(SourceError::MalformedCsv(format!(
                "{url} returned an HTML page instead of CSV (is the sheet shared or published?)"
            )));
        }

        let body = resp
            .text()
            .map_err(|e| SourceError::NetworkUnreachable(format!("reading body: {e}")))?;

        parse_csv(&body)
    }
}
