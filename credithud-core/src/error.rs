//! Fatal pipeline errors.
//!
//! Only conditions that abort a render cycle live here. An absent optional
//! column is a `Resolution::Absent`, and degenerate aggregates (mean of
//! nothing, ticket over zero rows) resolve to sentinels in `aggregate`.

use crate::data::SourceError;
use crate::schema::Role;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(#[from] SourceError),

    #[error("required column '{role}' not found (available columns: {})", available.join(", "))]
    RequiredColumnMissing { role: Role, available: Vec<String> },
}

impl PipelineError {
    /// Column labels to show next to the message, if any.
    pub fn available_columns(&self) -> Option<&[String]> {
        match self {
            PipelineError::RequiredColumnMissing { available, .. } => Some(available),
            PipelineError::SourceUnavailable(_) => None,
        }
    }
}
