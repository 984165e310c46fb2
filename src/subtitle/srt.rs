// SRT subtitle format
use super::Cue;
use crate::error::{Result, SubtransError};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use std::time::Duration;

static TIMING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})(?:\s|$)",
    )
    .expect("Invalid regex")
});

/// Parse SRT text into cues, in file order.
///
/// Accepts a leading BOM, CRLF line endings, extra blank lines between blocks,
/// `.` as millisecond separator and trailing position data on the timing line.
pub fn parse_srt(input: &str) -> Result<Vec<Cue>> {
    let text = input
        .strip_prefix('\u{feff}')
        .unwrap_or(input)
        .replace("\r\n", "\n")
        .replace('\r', "\n");

    let mut cues = Vec::new();
    let mut block: Vec<&str> = Vec::new();
    let mut block_start = 0;

    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            if !block.is_empty() {
                cues.push(parse_block(&block, block_start)?);
                block.clear();
            }
            continue;
        }
        if block.is_empty() {
            block_start = i + 1;
        }
        block.push(line);
    }

    if !block.is_empty() {
        cues.push(parse_block(&block, block_start)?);
    }

    Ok(cues)
}

fn parse_block(lines: &[&str], first_line: usize) -> Result<Cue> {
    let index_line = lines[0].trim();
    let index = index_line.parse::<usize>().map_err(|_| SubtransError::Parse {
        line: first_line,
        message: format!("expected cue index, found {:?}", index_line),
    })?;

    let timing_line = lines.get(1).map(|l| l.trim()).unwrap_or_default();
    let caps = TIMING_LINE
        .captures(timing_line)
        .ok_or_else(|| SubtransError::Parse {
            line: first_line + 1,
            message: format!("expected timing line, found {:?}", timing_line),
        })?;

    let start = parse_timestamp(&caps, 1, first_line + 1)?;
    let end = parse_timestamp(&caps, 5, first_line + 1)?;

    let content = lines.get(2..).unwrap_or_default().join("\n");

    Ok(Cue {
        index,
        start,
        end,
        content,
    })
}

fn parse_timestamp(caps: &Captures, start_idx: usize, line: usize) -> Result<Duration> {
    let field = |offset: usize| -> Result<u64> {
        let raw = caps.get(start_idx + offset).map_or("0", |m| m.as_str());
        // ",5" means 500 ms
        let raw = if offset == 3 {
            format!("{:0<3}", raw)
        } else {
            raw.to_string()
        };
        raw.parse::<u64>().map_err(|e| SubtransError::Parse {
            line,
            message: format!("invalid timestamp component {:?}: {}", raw, e),
        })
    };

    let hours = field(0)?;
    let minutes = field(1)?;
    let seconds = field(2)?;
    let millis = field(3)?;

    let total_secs = hours
        .checked_mul(3600)
        .and_then(|h| h.checked_add(minutes * 60 + seconds))
        .ok_or_else(|| SubtransError::Parse {
            line,
            message: "timestamp out of range".to_string(),
        })?;

    Ok(Duration::from_secs(total_secs) + Duration::from_millis(millis))
}

/// Serialize cues as SRT, keeping each cue's own index.
pub fn compose_srt(cues: &[Cue]) -> String {
    cues.iter()
        .map(|cue| {
            format!(
                "{}\n{} --> {}\n{}\n",
                cue.index,
                format_timestamp(cue.start),
                format_timestamp(cue.end),
                sanitize_content(&cue.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Blank lines would end the block early, so drop them.
fn sanitize_content(content: &str) -> String {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_timestamp(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    let millis = d.subsec_millis();
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
}
