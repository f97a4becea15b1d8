//! Record source abstraction
//!
//! The record service is an external collaborator: the pipeline only needs
//! it to answer a tag list and a query with a set of raw records.

mod file;
mod fluidinfo;

pub use file::JsonFileSource;
pub use fluidinfo::FluidinfoSource;

use crate::error::SourceError;
use crate::types::RecordSet;
use chrono::NaiveDate;

/// Result type for record source operations
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Name of the per-user tag marking objects as read
pub const HAS_READ_TAG: &str = "has-read";

/// A service that returns tagged records for a query
pub trait RecordSource: Send + Sync {
    /// Fetch the values of `tags` on every object matching `query`
    fn fetch_values(&self, tags: &[String], query: &str) -> SourceResult<RecordSet>;

    /// Tag every object matching `query` as read by `username` on `date`
    fn mark_as_read(&self, _username: &str, _query: &str, _date: NaiveDate) -> SourceResult<()> {
        Ok(())
    }

    /// Create the `<username>/has-read` tag
    fn create_read_tag(&self, _username: &str) -> SourceResult<()> {
        Ok(())
    }
}

/// Whether the record source answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceStatus {
    Ok,
    /// The source failed; the run continued with no records
    Unavailable(String),
}

impl SourceStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceStatus::Ok)
    }
}

/// Records plus how they were obtained
#[derive(Debug, Clone)]
pub struct Fetched {
    pub records: RecordSet,
    pub status: SourceStatus,
}

/// Fetch records, treating any failure as an empty result
pub fn fetch_or_empty(source: &dyn RecordSource, tags: &[String], query: &str) -> Fetched {
    tracing::info!(?tags, query, "Fetching records");
    match source.fetch_values(tags, query) {
        Ok(records) => {
            tracing::info!("Fetched {} records", records.len());
            Fetched {
                records,
                status: SourceStatus::Ok,
            }
        }
        Err(e) => {
            tracing::warn!(query, error = %e, "Problem getting results, continuing with none");
            Fetched {
                records: RecordSet::new(),
                status: SourceStatus::Unavailable(e.to_string()),
            }
        }
    }
}
