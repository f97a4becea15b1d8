//! Pipeline configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Default record service endpoint
pub const DEFAULT_SERVICE_URL: &str = "https://fluiddb.fluidinfo.com";

/// Tag carrying the `<book>:<chapter>:<verse>` identity
pub const ABOUT_TAG: &str = "fluiddb/about";

/// Settings for one assembly run.
///
/// Every field has a default so a partial JSON file is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Book title written into the template context
    pub title: String,

    /// File name of the finished archive
    pub archive_name: String,

    /// Root of the template set
    pub template_dir: PathBuf,

    /// Directory the archive is written to; the working tree lives inside it
    pub output_dir: PathBuf,

    /// Where downloaded images go, relative to the working tree
    pub images_dir: PathBuf,

    /// Prefix used by content documents to reference images
    pub image_href_prefix: String,

    /// Template files copied byte-for-byte instead of rendered
    pub binary_extensions: Vec<String>,

    /// Per-image fetch timeout
    pub fetch_timeout_secs: u64,

    /// Maximum concurrent image fetches
    pub fetch_parallelism: usize,

    /// Base URL of the record service
    pub record_service_url: String,

    /// Identity tag
    pub about_tag: String,

    /// Tags always requested from the record service
    pub required_tags: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: "The Bible".to_string(),
            archive_name: "bible.epub".to_string(),
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("."),
            images_dir: PathBuf::from("OEBPS/images"),
            image_href_prefix: "images".to_string(),
            binary_extensions: ["png", "jpg", "jpeg", "gif"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            fetch_timeout_secs: 30,
            fetch_parallelism: 4,
            record_service_url: DEFAULT_SERVICE_URL.to_string(),
            about_tag: ABOUT_TAG.to_string(),
            required_tags: vec![
                ABOUT_TAG.to_string(),
                "kingjamesbible/book".to_string(),
                "kingjamesbible/chapter".to_string(),
                "kingjamesbible/verse".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that paths resolved against the working tree stay inside it
    pub fn validate(&self) -> Result<(), ConfigError> {
        let escapes = self
            .images_dir
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(ConfigError::OutsideTree {
                field: "images_dir",
                value: self.images_dir.display().to_string(),
            });
        }
        Ok(())
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_template_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.template_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = name.into();
        self
    }

    pub fn with_record_service_url(mut self, url: impl Into<String>) -> Self {
        self.record_service_url = url.into();
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Whether a template file is copied rather than rendered
    pub fn is_binary_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                self.binary_extensions
                    .iter()
                    .any(|b| b.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
    }

    /// Trim the user's tag list, drop blanks and append any missing required tags
    pub fn merge_required_tags<I, S>(&self, tags: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut merged: Vec<String> = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        for required in &self.required_tags {
            if !merged.contains(required) {
                merged.push(required.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_required_tags() {
        let config = PipelineConfig::default();
        let tags = config.merge_required_tags([" ntoll/text ", "", "kingjamesbible/book"]);
        assert_eq!(
            tags,
            vec![
                "ntoll/text",
                "kingjamesbible/book",
                "fluiddb/about",
                "kingjamesbible/chapter",
                "kingjamesbible/verse",
            ]
        );
    }

    #[test]
    fn test_binary_template_detection() {
        let config = PipelineConfig::default();
        assert!(config.is_binary_template(Path::new("OEBPS/images/cover.PNG")));
        assert!(!config.is_binary_template(Path::new("OEBPS/content.opf")));
        assert!(!config.is_binary_template(Path::new("mimetype")));
    }

    #[test]
    fn test_images_dir_must_stay_in_tree() {
        assert!(PipelineConfig::default().validate().is_ok());

        for dir in ["/tmp/images", "../images", "OEBPS/../../images"] {
            let config = PipelineConfig {
                images_dir: PathBuf::from(dir),
                ..PipelineConfig::default()
            };
            assert!(matches!(
                config.validate(),
                Err(ConfigError::OutsideTree { field: "images_dir", .. })
            ));
        }
    }

    #[test]
    fn test_json_config_with_absolute_images_dir_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"images_dir": "/var/tmp/images"}"#).unwrap();

        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(ConfigError::OutsideTree { .. })
        ));
    }

    #[test]
    fn test_partial_json_config() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"title": "Psalms", "fetch_timeout_secs": 5}"#).unwrap();
        assert_eq!(config.title, "Psalms");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(config.archive_name, "bible.epub");
    }
}
