//! Single-driver lap lists (Lot66 style).
//!
//! The mail names one driver near the top, then lists laps as a standalone
//! lap number followed a few lines later by the lap time, with sector
//! columns or placeholders in between:
//!
//! ```text
//! Max van Lierop
//! 1
//! Lap 1
//! -
//! -
//! -
//! 00:35.560
//! ```
//!
//! Lines naming a venue are never taken as the driver, and mails with the
//! Spanish results markers are left to their own extractor.

use kartlog_core::time::{is_lap_time, parse_lap_time};
use kartlog_core::types::MIN_DRIVER_NAME_LEN;
use kartlog_core::LapRecord;

use super::{is_label, small_int, spanish, Document, LapExtractor};
use crate::cursor::LineCursor;

/// The driver name is searched for in this many leading lines.
pub const DRIVER_SCAN_LINES: usize = 10;

/// A lap time must appear within this many lines after its lap number.
pub const TIME_LOOKAHEAD_LINES: usize = 6;

/// Longest line considered as a driver name.
const MAX_NAME_CHARS: usize = 40;

/// Words that mark a line as branding, greeting or a column header.
const NOT_A_DRIVER: &[&str] = &[
    "lot66", "smstiming", "sms-timing", "apex", "timing", "karting", "karts", "results",
    "result", "resultaten", "uitslag", "session", "sessie", "heat", "race", "circuit",
    "track", "baan", "welcome", "welkom", "dear", "beste", "hello", "hallo", "hi", "thanks",
    "bedankt", "powered", "email", "www", "http", "https", "sector", "tijd", "time", "pos",
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "maandag",
    "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag", "january",
    "february", "march", "april", "may", "june", "july", "august", "september", "october",
    "november", "december", "januari", "februari", "maart", "mei", "juni", "juli",
    "augustus", "oktober",
];

pub struct SequentialSingleDriverExtractor;

impl LapExtractor for SequentialSingleDriverExtractor {
    fn name(&self) -> &'static str {
        "sequential_single_driver"
    }

    fn extract(&self, doc: &Document) -> Vec<LapRecord> {
        if spanish::has_markers(&doc.plain_text()) {
            return Vec::new();
        }
        let lines = doc.lines();
        let Some(driver_idx) = lines
            .iter()
            .take(DRIVER_SCAN_LINES)
            .position(|l| is_driver_line(l) && !doc.mentions_venue(l))
        else {
            return Vec::new();
        };
        let driver = lines[driver_idx].as_str();

        let mut laps = Vec::new();
        let mut cursor = LineCursor::at(lines, driver_idx + 1);
        while let Some(line) = cursor.peek() {
            if let Some(lap) = lap_number_line(line) {
                // Last time before the next lap number; sector times come first.
                let found = cursor
                    .lookahead(TIME_LOOKAHEAD_LINES)
                    .take_while(|(_, l)| lap_number_line(l).is_none())
                    .filter(|(_, l)| is_lap_time(l))
                    .last();
                if let Some((offset, time_line)) = found {
                    if let Some(record) =
                        LapRecord::new(driver, Some(lap), parse_lap_time(time_line))
                    {
                        laps.push(record);
                    }
                    cursor.advance_by(offset + 1);
                    continue;
                }
            }
            cursor.advance();
        }
        laps
    }
}

fn lap_number_line(line: &str) -> Option<u32> {
    let line = line.trim();
    if line.ends_with('.') {
        return None;
    }
    small_int(line)
}

fn is_driver_line(line: &str) -> bool {
    let line = line.trim();
    let chars = line.chars().count();
    if chars < MIN_DRIVER_NAME_LEN || chars > MAX_NAME_CHARS || is_label(line) {
        return false;
    }
    if !line
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'' || c == '.')
    {
        return false;
    }
    if line.chars().filter(|c| c.is_alphabetic()).count() < MIN_DRIVER_NAME_LEN {
        return false;
    }
    let words: Vec<String> = line.split_whitespace().map(|w| w.to_lowercase()).collect();
    words.len() <= 5 && !words.iter().any(|w| NOT_A_DRIVER.contains(&w.as_str()))
}
