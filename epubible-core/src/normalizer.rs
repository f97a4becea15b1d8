//! Turns raw tagged records into verse entries

use crate::config::PipelineConfig;
use crate::error::NormalizeError;
use crate::types::{ImageRef, RawRecord, RecordSet, TagValue, VerseEntry};
use regex::Regex;
use std::sync::LazyLock;

/// Markup artifact left in verse text by the source data
pub const TEXT_ARTIFACT: &str = "&nbsp;";

static ABOUT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]+):(\d+):(\d+)$").expect("valid about pattern"));

/// Verse entries plus the records that could not be normalized
#[derive(Debug, Default)]
pub struct Normalized {
    pub entries: Vec<VerseEntry>,
    pub dropped: Vec<NormalizeError>,
}

/// Normalizes raw records against a record service
#[derive(Debug, Clone)]
pub struct Normalizer {
    about_tag: String,
    service_url: String,
}

impl Normalizer {
    pub fn new(about_tag: impl Into<String>, service_url: impl Into<String>) -> Self {
        Self {
            about_tag: about_tag.into(),
            service_url: service_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(&config.about_tag, &config.record_service_url)
    }

    /// Normalize every record. Records are visited in object id order;
    /// malformed ones are logged and skipped.
    pub fn normalize(&self, records: &RecordSet) -> Normalized {
        tracing::info!("Cleaning {} results", records.len());
        let mut normalized = Normalized::default();

        for (object_id, record) in &records.objects {
            match self.normalize_record(object_id, record) {
                Ok(entry) => normalized.entries.push(entry),
                Err(e) => {
                    tracing::warn!(object_id = %object_id, "Dropping record: {}", e);
                    normalized.dropped.push(e);
                }
            }
        }

        tracing::info!(
            "Cleaned {} results, dropped {}",
            normalized.entries.len(),
            normalized.dropped.len()
        );
        normalized
    }

    /// Normalize one record
    pub fn normalize_record(
        &self,
        object_id: &str,
        record: &RawRecord,
    ) -> Result<VerseEntry, NormalizeError> {
        let about = record
            .get(&self.about_tag)
            .and_then(TagValue::as_str)
            .ok_or_else(|| NormalizeError::MissingAbout {
                object_id: object_id.to_string(),
            })?;
        let (book, chapter, verse) =
            parse_about(about).ok_or_else(|| NormalizeError::MalformedAbout {
                object_id: object_id.to_string(),
                about: about.to_string(),
            })?;

        let mut entry = VerseEntry::new(book, chapter, verse).with_object_id(object_id);
        entry.about = about.to_string();

        for (tag, value) in record {
            match value {
                TagValue::Scalar(serde_json::Value::String(s)) if tag.contains("text") => {
                    entry.texts.push(strip_artifacts(s));
                }
                TagValue::Scalar(_) => {}
                TagValue::List(items) => {
                    entry.image_refs.extend(
                        items
                            .iter()
                            .filter(|item| item.starts_with("http"))
                            .map(ImageRef::listed),
                    );
                }
                TagValue::Opaque { value_type } if value_type.contains("image") => {
                    let url = format!("{}/about/{}/{}", self.service_url, about, tag);
                    tracing::debug!(object_id, tag = %tag, %url, "Synthesized image reference");
                    entry.image_refs.push(ImageRef::declared(url, value_type));
                }
                TagValue::Opaque { value_type } => {
                    tracing::debug!(
                        object_id,
                        tag = %tag,
                        value_type = %value_type,
                        "Ignoring opaque value"
                    );
                }
            }
        }

        Ok(entry)
    }
}

/// Split `<book>:<chapter>:<verse>` into its parts
pub fn parse_about(about: &str) -> Option<(&str, u32, u32)> {
    let caps = ABOUT_PATTERN.captures(about)?;
    let book = caps.get(1)?.as_str();
    let chapter = caps.get(2)?.as_str().parse().ok()?;
    let verse = caps.get(3)?.as_str().parse().ok()?;
    Some((book, chapter, verse))
}

/// Remove the markup artifact from verse text
pub fn strip_artifacts(text: &str) -> String {
    text.replace(TEXT_ARTIFACT, "")
}
