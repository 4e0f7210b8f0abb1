//! Table model, source fetchers and fetch caching

pub mod cache;
pub mod csv_import;
pub mod file;
pub mod http;
pub mod provider;
pub mod sheets;
pub mod table;

pub use cache::{CacheStatus, SourceCache, DEFAULT_TTL};
pub use csv_import::parse_csv;
pub use file::{classify, FileCsvFetcher, LocationRouter};
pub use http::HttpCsvFetcher;
pub use provider::{DataSource, SourceError, SourceFetcher};
pub use table::{Cell, Table, TableError};
