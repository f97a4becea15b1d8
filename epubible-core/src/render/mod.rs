//! Document rendering
//!
//! Verse entries become markup fragments; the fragments, image list and book
//! metadata are then substituted into a template set mirrored into the
//! working tree.

mod fragment;
mod templates;

pub use fragment::{render_fragments, CHAPTER_BREAK};
pub use templates::{RenderedTree, TemplateSet};
