use serde::{Deserialize, Serialize};

use crate::formats::time::Timestamp;

/// A run of caption text with uniform styling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTextPart {
    pub text: String,
    pub italic: bool,
}

impl SubtitleTextPart {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: true,
        }
    }
}

/// Half-open interval `[start, end)` during which an entry is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitlePeriod {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl SubtitlePeriod {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    pub fn length_ms(&self) -> i64 {
        self.end.total_ms().saturating_sub(self.start.total_ms())
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.start <= time && time < self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    /// Index as written in the source file; not checked for uniqueness.
    pub index: i64,
    pub period: SubtitlePeriod,
    pub text: Vec<SubtitleTextPart>,
}
