//! Per-verse markup

use crate::assets::ResolvedAssets;
use crate::normalizer::strip_artifacts;
use crate::types::{OrderedVerseSequence, RenderedFragment};
use std::collections::HashSet;

/// Marker emitted before the first verse of each new chapter
pub const CHAPTER_BREAK: &str = "<br/><br/>";

/// Render one fragment per verse entry that has something to show.
///
/// A chapter break precedes an entry whose chapter is higher than every
/// chapter rendered before it. Images appear once per entry, before the text.
pub fn render_fragments(
    sequence: &OrderedVerseSequence,
    assets: &ResolvedAssets,
    href_prefix: &str,
) -> Vec<RenderedFragment> {
    let index = assets.index();
    let mut fragments = Vec::with_capacity(sequence.len());
    let mut highest_chapter: Option<u32> = None;

    for entry in sequence {
        let mut seen = HashSet::new();
        let images: String = entry
            .image_refs
            .iter()
            .filter_map(|r| index.get(r.url.as_str()).copied())
            .filter(|asset| seen.insert(asset.source_url.as_str()))
            .map(|asset| image_block(href_prefix, &asset.filename))
            .collect();
        let text: String = entry.texts.iter().map(|t| strip_artifacts(t)).collect();

        if images.is_empty() && text.is_empty() {
            tracing::debug!(about = %entry.about, "Nothing to render");
            continue;
        }

        let mut markup = String::new();
        match highest_chapter {
            Some(highest) if entry.chapter > highest => {
                markup.push_str(CHAPTER_BREAK);
                highest_chapter = Some(entry.chapter);
            }
            None => highest_chapter = Some(entry.chapter),
            _ => {}
        }
        markup.push_str(&images);
        markup.push_str(&text);
        fragments.push(RenderedFragment::new(markup));
    }

    tracing::info!("Rendered {} fragments", fragments.len());
    fragments
}

fn image_block(href_prefix: &str, filename: &str) -> String {
    let prefix = href_prefix.trim_end_matches('/');
    let src = if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    };
    format!(
        "<div>\n<img src=\"{}\" alt=\"An illustration\"/>\n</div>",
        escape_attr(&src)
    )
}

/// Escape a value for use inside a double-quoted attribute
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
