//! Deterministic verse ordering

use crate::types::{OrderedVerseSequence, VerseEntry};

/// Sort key: chapter, then verse
pub fn verse_key(entry: &VerseEntry) -> (u32, u32) {
    (entry.chapter, entry.verse)
}

/// Order entries by `(chapter, verse)`. Equal keys keep their input order.
pub fn order(mut entries: Vec<VerseEntry>) -> OrderedVerseSequence {
    tracing::info!("Ordering {} results by chapter and verse", entries.len());
    entries.sort_by_key(verse_key);
    OrderedVerseSequence::from_sorted(entries)
}

impl OrderedVerseSequence {
    /// Apply the ordering again; a no-op on an ordered sequence
    pub fn reorder(self) -> Self {
        order(self.into_entries())
    }
}

impl From<Vec<VerseEntry>> for OrderedVerseSequence {
    fn from(entries: Vec<VerseEntry>) -> Self {
        order(entries)
    }
}
