//! Batching of consecutive cues into translation groups.

use super::Cue;
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex"));

/// Thresholds that decide where one group ends and the next begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupingOptions {
    /// Largest allowed gap between a cue's start and the previous cue's end (default: 2 seconds).
    pub max_gap: Duration,
    /// Largest allowed sum of raw content characters in one group (default: 500).
    pub max_length: usize,
}

impl Default for GroupingOptions {
    fn default() -> Self {
        Self {
            max_gap: Duration::from_secs(2),
            max_length: 500,
        }
    }
}

/// A non-empty run of contiguous cues that share one translation.
#[derive(Debug, Clone, PartialEq)]
pub struct CueGroup {
    cues: Vec<Cue>,
    char_count: usize,
}

impl CueGroup {
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Always false for groups produced by [`group_cues`].
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    /// Sum of the raw content lengths of the cues.
    pub fn char_count(&self) -> usize {
        self.char_count
    }

    /// Text sent for translation: each cue's content whitespace-normalized, joined by spaces.
    pub fn joined_text(&self) -> String {
        self.cues
            .iter()
            .map(|cue| normalize_whitespace(&cue.content))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Collapse whitespace runs to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Partition cues into contiguous groups in a single forward pass.
///
/// A new group starts when the gap to the previous cue exceeds `max_gap`, or
/// when the incoming cue's raw length would push the running total past
/// `max_length`. The length check works on raw content, so the normalized
/// joined text of a group may still end up longer than `max_length`. A cue
/// that is longer than `max_length` on its own still forms a group.
pub fn group_cues(cues: &[Cue], options: &GroupingOptions) -> Vec<CueGroup> {
    let mut groups = Vec::new();
    let mut buffer: Vec<Cue> = Vec::new();
    let mut current_length = 0usize;

    for cue in cues {
        let cue_length = cue.char_count();

        if let Some(prev) = buffer.last() {
            // overlapping cues never count as a gap
            let gap_exceeded = cue
                .start
                .checked_sub(prev.end)
                .is_some_and(|gap| gap > options.max_gap);
            if gap_exceeded || current_length + cue_length > options.max_length {
                groups.push(CueGroup {
                    cues: std::mem::take(&mut buffer),
                    char_count: current_length,
                });
                current_length = 0;
            }
        }

        buffer.push(cue.clone());
        current_length += cue_length;
    }

    if !buffer.is_empty() {
        groups.push(CueGroup {
            cues: buffer,
            char_count: current_length,
        });
    }

    groups
}
