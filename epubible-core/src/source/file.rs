//! Record source backed by a saved `/values` response

use super::{RecordSource, SourceResult};
use crate::error::SourceError;
use crate::types::{RecordSet, ValuesEnvelope};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Reads records from a JSON file holding a `/values` envelope.
///
/// The query and tag list are ignored; the file is the result.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonFileSource {
    fn fetch_values(&self, _tags: &[String], _query: &str) -> SourceResult<RecordSet> {
        let data = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;
        let envelope: ValuesEnvelope = serde_json::from_str(&data)
            .map_err(|e| SourceError::Decode(format!("{}: {}", self.path.display(), e)))?;
        Ok(envelope.results)
    }

    fn mark_as_read(&self, username: &str, query: &str, date: NaiveDate) -> SourceResult<()> {
        tracing::info!(username, query, %date, "Offline source, not marking objects as read");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reads_envelope() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(
            &path,
            r#"{"results": {"id": {"a": {"fluiddb/about": {"value": "Genesis:1:1"}}}}}"#,
        )
        .unwrap();

        let records = JsonFileSource::new(&path).fetch_values(&[], "").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = JsonFileSource::new("/nonexistent/values.json").fetch_values(&[], "");
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("values.json");
        std::fs::write(&path, "not json").unwrap();

        let result = JsonFileSource::new(&path).fetch_values(&[], "");
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }
}
