//! WebVTT subtitle parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single caption cue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptCue {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

fn tag_regex() -> &'static Regex {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"))
}

/// Parse WebVTT content into cues.
///
/// Inline tags (word timings, styling) are stripped, and lines repeated from the
/// previous cue are dropped. YouTube auto captions roll each line through two
/// consecutive cues, so without this the transcript would contain every line twice.
pub fn parse_vtt(content: &str) -> Vec<TranscriptCue> {
    let mut cues = Vec::new();
    let mut last_line: Option<String> = None;
    let mut lines = content.lines().peekable();

    while let Some(line) = lines.next() {
        let line = line.trim();
        let Some((start, end)) = parse_timing_line(line) else {
            continue;
        };

        let mut text_parts = Vec::new();
        while let Some(next) = lines.peek() {
            let next = next.trim();
            if next.is_empty() {
                break;
            }
            let cleaned = clean_text(next);
            lines.next();

            if cleaned.is_empty() || last_line.as_deref() == Some(cleaned.as_str()) {
                continue;
            }
            last_line = Some(cleaned.clone());
            text_parts.push(cleaned);
        }

        if !text_parts.is_empty() {
            cues.push(TranscriptCue {
                start_seconds: start,
                end_seconds: end,
                text: text_parts.join(" "),
            });
        }
    }

    cues
}

/// Parse `00:00:01.000 --> 00:00:04.000 align:start` into seconds.
fn parse_timing_line(line: &str) -> Option<(f64, f64)> {
    let (start, rest) = line.split_once("-->")?;
    let end = rest.split_whitespace().next()?;
    Some((parse_timestamp(start.trim())?, parse_timestamp(end)?))
}

/// Parse `HH:MM:SS.mmm` or `MM:SS.mmm`.
fn parse_timestamp(ts: &str) -> Option<f64> {
    let parts: Vec<&str> = ts.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s),
        _ => return None,
    };
    let seconds = seconds.replace(',', ".").parse::<f64>().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn clean_text(line: &str) -> String {
    let stripped = tag_regex().replace_all(line, "");
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
