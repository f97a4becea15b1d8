//! Error types for epubible core

use thiserror::Error;

/// Result type alias using EpubibleError
pub type Result<T> = std::result::Result<T, EpubibleError>;

/// Top-level error type for all pipeline operations
#[derive(Debug, Error)]
pub enum EpubibleError {
    #[error("Record source error: {0}")]
    Source(#[from] SourceError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Packaging error: {0}")]
    Package(#[from] PackageError),

    #[error("Asset error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors talking to the record service
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Record service returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Cannot read record file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A record that cannot become a verse entry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("Record {object_id} has no about value")]
    MissingAbout { object_id: String },

    #[error("Record {object_id} has malformed about value {about:?}")]
    MalformedAbout { object_id: String, about: String },
}

/// A single image that could not be fetched or stored
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Fetching {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Fetching {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Cannot write image {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors rendering the template set into the working tree
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid template {name}: {source}")]
    InvalidTemplate {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("Failed to render {name}: {source}")]
    Substitution {
        name: String,
        #[source]
        source: tera::Error,
    },

    #[error("Template set not found: {0}")]
    MissingTemplateSet(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors building the EPUB container
#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Working tree mimetype declares {found:?}, expected {expected:?}")]
    MimetypeConflict { found: String, expected: String },

    #[error("Working tree has no parent directory: {0}")]
    NoParent(String),

    #[error("IO error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors loading pipeline configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{field} must be a relative path inside the working tree, got {value}")]
    OutsideTree { field: &'static str, value: String },
}
