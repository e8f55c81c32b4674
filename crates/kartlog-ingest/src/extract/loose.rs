//! Last-resort extraction: any line carrying a lap time, with the text in
//! front of the time read as the driver name.

use kartlog_core::types::MIN_DRIVER_NAME_LEN;
use kartlog_core::LapRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{find_time, is_label, Document, LapExtractor};

/// `"3. "` or `"3) "` in front of a name.
static POSITION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{1,3})[.)]\s*(.*)$").unwrap());

pub struct LooseLineHeuristicExtractor;

impl LapExtractor for LooseLineHeuristicExtractor {
    fn name(&self) -> &'static str {
        "loose_line_heuristic"
    }

    fn extract(&self, doc: &Document) -> Vec<LapRecord> {
        doc.lines().iter().filter_map(|line| line_to_lap(line)).collect()
    }
}

fn line_to_lap(line: &str) -> Option<LapRecord> {
    let (start, time) = find_time(line)?;
    let prefix = &line[..start];

    let (position, name) = match POSITION_PREFIX_RE.captures(prefix) {
        Some(caps) => (caps[1].parse().ok(), caps.get(2).map_or("", |m| m.as_str())),
        None => (None, prefix),
    };
    let name = name
        .trim()
        .trim_end_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '|' | ',' | ';' | '–'))
        .trim();

    if name.chars().count() < MIN_DRIVER_NAME_LEN
        || !name.chars().any(char::is_alphabetic)
        || is_label(name)
    {
        return None;
    }
    Some(LapRecord::new(name, None, time)?.with_position(position))
}
