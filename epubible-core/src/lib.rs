//! epubible core library
//!
//! Builds a personalised EPUB Bible from tagged verse records. Records are
//! normalized into verse entries, ordered by chapter and verse, their images
//! downloaded once each, rendered through a template set and packaged into
//! an EPUB container.

pub mod assets;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod order;
pub mod package;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod types;

pub use config::PipelineConfig;
pub use error::{
    ConfigError, EpubibleError, FetchError, NormalizeError, PackageError, RenderError, Result,
    SourceError,
};
pub use pipeline::{Pipeline, RunReport, RunRequest};
pub use types::{
    ImageAsset, ImageKind, ImageRef, OrderedVerseSequence, RawRecord, RecordSet, RenderContext,
    RenderedFragment, TagValue, ValuesEnvelope, VerseEntry,
};
