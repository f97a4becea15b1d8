//! Normalized verse entries

use serde::{Deserialize, Serialize};

/// A reference to an image that may be embedded next to a verse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Absolute URL of the image
    pub url: String,

    /// MIME type declared by the record service for opaque values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_mime: Option<String>,
}

impl ImageRef {
    /// A URL found in a list value
    pub fn listed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            declared_mime: None,
        }
    }

    /// A URL synthesized for an opaque image value
    pub fn declared(url: impl Into<String>, mime: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            declared_mime: Some(mime.into()),
        }
    }
}

/// One Bible verse with its coordinates, text and illustrations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseEntry {
    /// Object id the entry was normalized from
    pub object_id: String,

    /// `<book>:<chapter>:<verse>`
    pub about: String,

    pub book: String,
    pub chapter: u32,
    pub verse: u32,

    /// Text tag contents in tag-name order
    pub texts: Vec<String>,

    /// Image references in tag-name order
    pub image_refs: Vec<ImageRef>,
}

impl VerseEntry {
    /// Create an entry with no text or images
    pub fn new(book: impl Into<String>, chapter: u32, verse: u32) -> Self {
        let book = book.into();
        let about = format!("{}:{}:{}", book, chapter, verse);
        Self {
            object_id: about.clone(),
            about,
            book,
            chapter,
            verse,
            texts: Vec::new(),
            image_refs: Vec::new(),
        }
    }

    /// Append a text fragment
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.texts.push(text.into());
        self
    }

    /// Append an image reference
    pub fn with_image(mut self, image: ImageRef) -> Self {
        self.image_refs.push(image);
        self
    }

    /// Set the source object id
    pub fn with_object_id(mut self, object_id: impl Into<String>) -> Self {
        self.object_id = object_id.into();
        self
    }
}

/// Verse entries in `(chapter, verse)` order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderedVerseSequence {
    entries: Vec<VerseEntry>,
}

impl OrderedVerseSequence {
    /// Wrap entries that are already ordered
    pub(crate) fn from_sorted(entries: Vec<VerseEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[VerseEntry] {
        &self.entries
    }

    /// Mutable access for in-place image reference pruning.
    /// Entries can be edited but not reordered or removed.
    pub fn entries_mut(&mut self) -> &mut [VerseEntry] {
        &mut self.entries
    }

    pub fn into_entries(self) -> Vec<VerseEntry> {
        self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VerseEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a OrderedVerseSequence {
    type Item = &'a VerseEntry;
    type IntoIter = std::slice::Iter<'a, VerseEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
