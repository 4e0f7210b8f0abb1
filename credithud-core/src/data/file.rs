//! Local CSV fetcher and the location router.

use super::csv_import::parse_csv;
use super::http::HttpCsvFetcher;
use super::provider::{DataSource, SourceError, SourceFetcher};
use super::table::Table;
use std::path::PathBuf;

/// Reads CSV exports from the local filesystem. Accepts plain paths and
/// `file://` locations.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCsvFetcher;

impl FileCsvFetcher {
    fn path_of(location: &str) -> PathBuf {
        PathBuf::from(location.strip_prefix("file://").unwrap_or(location))
    }
}

impl SourceFetcher for FileCsvFetcher {
    fn name(&self) -> &str {
        "file_csv"
    }

    fn fetch(&self, location: &str) -> Result<Table, SourceError> {
        let path = Self::path_of(location);
        let content =
            std::fs::read_to_string(&path).map_err(|source| SourceError::Io { path, source })?;
        parse_csv(&content)
    }
}

/// Which kind of source a location points at.
pub fn classify(location: &str) -> Result<DataSource, SourceError> {
    let lower = location.trim().to_ascii_lowercase();
    if lower.is_empty() {
        return Err(SourceError::InvalidLocation("empty source location".into()));
    }
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Ok(DataSource::Http)
    } else if lower.contains("://") && !lower.starts_with("file://") {
        Err(SourceError::InvalidLocation(format!(
            "unsupported scheme in '{location}'"
        )))
    } else {
        Ok(DataSource::File)
    }
}

/// Dispatches to the HTTP or file fetcher by location scheme.
pub struct LocationRouter {
    http: HttpCsvFetcher,
    file: FileCsvFetcher,
}

impl LocationRouter {
    pub fn new() -> Result<Self, SourceError> {
        Ok(Self {
            http: HttpCsvFetcher::new()?,
            file: FileCsvFetcher,
        })
    }
}

impl SourceFetcher for LocationRouter {
    fn name(&self) -> &str {
        "router"
    }

    fn fetch(&self, location: &str) -> Result<Table, SourceError> {
        match classify(location)? {
            DataSource::Http => self.http.fetch(location),
            DataSource::File => self.file.fetch(location),
        }
    }
}
