//! Spanish "RESULTADOS DETALLADOS" mails (Fastkart and similar).
//!
//! A summary block (`Pilotos N. V. Mejor V. en V. GAP`) names the driver,
//! kart and finishing position; the detailed section lists one lap per
//! line, either `"<lap> <time>"` or a bare `"<time>"` continuing the count,
//! until an averages line.

use kartlog_core::time::parse_lap_time;
use kartlog_core::LapRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{Document, LapExtractor};
use crate::cursor::LineCursor;

static TRIGGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)resultados\s+detallados|mejor\s+v\.").unwrap());
static SECTION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)resultados\s+detallados").unwrap());
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)mejor\s+v\.").unwrap());
static DRIVER_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:piloto|pilot|driver|nombre)\s*[:\-]\s*(.+?)\s*$").unwrap()
});
static SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)pilotos\s+n\.\s*v\.\s+mejor\s+v\.\s+en\s+v\.\s+gap\s+(\d{1,3})\s+(\S+)").unwrap()
});
static KART_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*kart\s*(?:n[º°o]\.?)?\s*[:#]?\s*([a-z]{0,3}\s?\d{1,3})\s*$").unwrap()
});
static KART_SUMMARY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Z]{1,3}\s+\d{1,3})\s+\d+\s+\d+:\d+\.\d+").unwrap());
static NUMBERED_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})\s+((?:\d{1,2}:)?\d{1,2}\.\d{3})(?:\s|$)").unwrap());
static BARE_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^((?:\d{1,2}:)?\d{1,2}\.\d{3})$").unwrap());
static END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:avg|media|promedio)\b").unwrap());

/// Whether the text carries the Spanish results markers. Earlier
/// extractors leave such mails to [`SpanishDetailedResultsExtractor`].
pub(crate) fn has_markers(text: &str) -> bool {
    TRIGGER_RE.is_match(text)
}

pub struct SpanishDetailedResultsExtractor;

impl LapExtractor for SpanishDetailedResultsExtractor {
    fn name(&self) -> &'static str {
        "spanish_detailed_results"
    }

    fn extract(&self, doc: &Document) -> Vec<LapRecord> {
        let text = doc.plain_text();
        if !has_markers(&text) {
            return Vec::new();
        }

        let summary = SUMMARY_RE.captures(&text);
        let driver = DRIVER_FIELD_RE
            .captures(&text)
            .map(|c| c[1].to_string())
            .or_else(|| summary.as_ref().map(|c| c[2].to_string()));
        let Some(driver) = driver else {
            return Vec::new();
        };
        let position: Option<u32> = summary.as_ref().and_then(|c| c[1].parse().ok());
        let kart = KART_FIELD_RE
            .captures(&text)
            .or_else(|| KART_SUMMARY_RE.captures(&text))
            .map(|c| c[1].split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase());

        let lines = doc.lines();
        let start = lines
            .iter()
            .position(|l| SECTION_RE.is_match(l))
            .or_else(|| lines.iter().position(|l| HEADER_RE.is_match(l)));
        let Some(start) = start else {
            return Vec::new();
        };

        let mut laps = Vec::new();
        let mut last_lap = 0u32;
        let mut cursor = LineCursor::at(lines, start + 1);
        while let Some(line) = cursor.advance() {
            if END_RE.is_match(line) {
                break;
            }
            let (lap, time) = if let Some(caps) = NUMBERED_ROW_RE.captures(line) {
                match caps[1].parse::<u32>() {
                    Ok(n) => (n, parse_lap_time(&caps[2])),
                    Err(_) => continue,
                }
            } else if let Some(caps) = BARE_ROW_RE.captures(line) {
                (last_lap + 1, parse_lap_time(&caps[1]))
            } else {
                continue;
            };
            last_lap = lap;

            if let Some(record) = LapRecord::new(&driver, Some(lap), time) {
                laps.push(record.with_position(position).with_kart(kart.clone()));
            }
        }
        laps
    }
}
