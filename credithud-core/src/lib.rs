//! CreditHUD Core — data loading, column resolution, filtering and aggregation.
//!
//! This crate is the pipeline behind the credit-operations dashboard:
//! - Table model with typed cells and a stable column order
//! - Source fetchers for HTTP(S) and local CSV exports, plus a TTL cache
//! - Schema normalizer binding logical column roles by index or label
//! - Filter engine (value domains, conjunctive membership filter)
//! - Aggregator (KPI scalars, plan-type sums, year/month counts)
//!
//! Data flows one way: fetch → normalize → filter → aggregate. Fatal
//! conditions surface as `PipelineError`; everything else degrades locally.

pub mod aggregate;
pub mod config;
pub mod data;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod schema;

pub use aggregate::Summary;
pub use config::{ConfigError, DashboardConfig};
pub use data::{Cell, SourceCache, SourceError, SourceFetcher, Table};
pub use error::PipelineError;
pub use filter::{FilterEngine, FilteredView, Selection};
pub use pipeline::{load, load_cached, Dashboard, DashboardSnapshot, LoadedTable};
pub use schema::{Bindings, Resolution, Role, RoleConfig, RoleSpec};
