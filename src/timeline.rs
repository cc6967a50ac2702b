use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{formats::time::Timestamp, model::SubtitleEntry};

/// Lookups assume entries sorted by start with no overlaps; this is not
/// checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timeline {
    entries: Vec<SubtitleEntry>,
}

impl Timeline {
    pub fn new(entries: Vec<SubtitleEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[SubtitleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// End of the last entry, or zero for an empty timeline.
    pub fn end(&self) -> Timestamp {
        self.entries
            .last()
            .map(|e| e.period.end)
            .unwrap_or(Timestamp::ZERO)
    }

    pub fn find_active_position(&self, time: Timestamp) -> Option<usize> {
        self.entries
            .binary_search_by(|entry| {
                if time < entry.period.start {
                    Ordering::Greater
                } else if time >= entry.period.end {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .ok()
    }

    pub fn find_active_entry(&self, time: Timestamp) -> Option<&SubtitleEntry> {
        self.find_active_position(time).map(|i| &self.entries[i])
    }
}
