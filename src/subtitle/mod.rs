pub mod group;
pub mod reassemble;
pub mod srt;

use std::time::Duration;

pub use group::{group_cues, normalize_whitespace, CueGroup, GroupingOptions};
pub use reassemble::reassemble;
pub use srt::{compose_srt, parse_srt};

/// A single timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub content: String,
}

impl Cue {
    pub fn new(index: usize, start: Duration, end: Duration, content: impl Into<String>) -> Self {
        Self {
            index,
            start,
            end,
            content: content.into(),
        }
    }

    /// Content length in characters, as used by the grouping threshold.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}
