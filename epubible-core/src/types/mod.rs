//! Core types flowing through the assembly pipeline

mod asset;
mod context;
mod record;
mod verse;

pub use asset::{ImageAsset, ImageKind};
pub use context::{RenderContext, RenderedFragment};
pub use record::{RawRecord, RecordSet, TagValue, ValuesEnvelope};
pub use verse::{ImageRef, OrderedVerseSequence, VerseEntry};
