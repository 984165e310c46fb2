use super::{Cue, CueGroup};

/// Spread one translated text back over the cues of a group.
///
/// Every output cue carries the same `translated_text`; index, start and end
/// are taken from the matching input cue. Timings are not merged across the
/// group.
pub fn reassemble(group: &CueGroup, translated_text: &str) -> Vec<Cue> {
    group
        .cues()
        .iter()
        .map(|cue| Cue {
            index: cue.index,
            start: cue.start,
            end: cue.end,
            content: translated_text.to_string(),
        })
        .collect()
}
