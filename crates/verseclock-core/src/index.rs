//! Lookup of candidate verses by clock slot.

use std::collections::HashMap;

use crate::corpus::VerseRecord;

/// Verses grouped by `(chapter, verse)`, read as `(hour, minute)`.
///
/// Book identity is not part of the key: `Genesis 3:15` and `Luke 3:15` both land in
/// the `03:15` slot. Records keep corpus order within a slot.
#[derive(Debug, Default, Clone)]
pub struct VerseIndex {
    slots: HashMap<(u32, u32), Vec<VerseRecord>>,
}

impl VerseIndex {
    pub fn build<I>(verses: I) -> Self
    where
        I: IntoIterator<Item = VerseRecord>,
    {
        let mut slots: HashMap<(u32, u32), Vec<VerseRecord>> = HashMap::new();
        for verse in verses {
            slots
                .entry((verse.chapter, verse.verse))
                .or_default()
                .push(verse);
        }
        Self { slots }
    }

    /// Candidates for a slot; empty when nothing in the corpus matches.
    pub fn candidates(&self, hour: u32, minute: u32) -> &[VerseRecord] {
        self.slots
            .get(&(hour, minute))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of distinct `(chapter, verse)` keys.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Number of slots inside the 24-hour clock that have at least one candidate.
    pub fn clock_coverage(&self) -> usize {
        self.slots
            .keys()
            .filter(|(hour, minute)| (1..=24).contains(hour) && (1..60).contains(minute))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
