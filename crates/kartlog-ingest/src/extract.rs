//! Lap-data extraction strategies.
//!
//! Each extractor recognises one family of vendor layouts and returns the
//! laps it can find, or nothing. Extractors are total: malformed input
//! yields an empty list, never an error. The pipeline tries them in the
//! order of [`default_extractors`] and keeps the first non-empty answer.

pub mod detailed;
pub mod html;
pub mod html_table;
pub mod loose;
pub mod sequential;
pub mod spanish;

use kartlog_core::time::{is_lap_time, parse_lap_time};
use kartlog_core::types::MIN_DRIVER_NAME_LEN;
use kartlog_core::LapRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::track::TrackCatalog;

pub use detailed::DetailedLapTableExtractor;
pub use html_table::GenericHtmlTableExtractor;
pub use loose::LooseLineHeuristicExtractor;
pub use sequential::SequentialSingleDriverExtractor;
pub use spanish::SpanishDetailedResultsExtractor;

/// Largest integer read as a lap number, position or kart number.
pub const MAX_SMALL_INT: u32 = 999;

/// A lap time embedded in text, not glued to other digits.
static TIME_IN_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[^\d:.])((?:\d{1,2}:)?\d{1,2}\.\d{3})(?:$|[^\d])").unwrap()
});

/// Venue names of the built-in catalog, for documents built without one.
static BUILTIN_VENUES: Lazy<Vec<String>> = Lazy::new(|| TrackCatalog::builtin().venue_terms());

/// Words that label columns or summary lines rather than name a driver.
const NON_NAME_WORDS: &[&str] = &[
    "pos", "position", "positie", "naam", "name", "driver", "coureur", "piloot", "piloto",
    "pilotos", "kart", "lap", "laps", "ronde", "rondes", "vuelta", "vueltas", "time", "tijd",
    "tiempo", "best", "beste", "mejor", "gap", "diff", "interval", "avg", "average", "gem",
    "gemiddeld", "media", "total", "totaal", "hist", "fastest", "snelste", "sector", "s1",
    "s2", "s3", "speed", "km/h",
];

/// Words that, as the first word of a line, mark it as a label or summary.
const SUMMARY_LEADS: &[&str] = &[
    "lap", "laps", "ronde", "vuelta", "best", "beste", "mejor", "avg", "average", "gem",
    "gemiddeld", "media", "total", "totaal", "gap", "fastest", "snelste", "hist",
];

/// Decoded text prepared for extraction: the source as decoded, plus its
/// non-empty trimmed lines (HTML rendered to one line per block or cell),
/// and the venue names that must not be read as driver names.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    lines: Vec<String>,
    is_html: bool,
    venues: Vec<String>,
}

impl Document {
    /// A document checked against the built-in track catalog's venues.
    pub fn new(text: &str) -> Self {
        Self::with_venues(text, BUILTIN_VENUES.as_slice())
    }

    /// A document checked against the given venue names and synonyms.
    pub fn with_venues<S: AsRef<str>>(text: &str, venues: &[S]) -> Self {
        let is_html = html::looks_like_html(text);
        let lines = if is_html {
            html::html_to_lines(text)
        } else {
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };
        let venues = venues
            .iter()
            .map(|v| word_key(v.as_ref()))
            .filter(|v| !v.is_empty())
            .map(|v| format!(" {} ", v))
            .collect();
        Self {
            source: text.to_string(),
            lines,
            is_html,
            venues,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_html(&self) -> bool {
        self.is_html
    }

    /// Lines joined with newlines; markup already removed.
    pub fn plain_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Whether the text names a venue, matching whole words.
    pub fn mentions_venue(&self, text: &str) -> bool {
        let key = format!(" {} ", word_key(text));
        self.venues.iter().any(|v| key.contains(v.as_str()))
    }
}

/// Lower-cased alphanumeric words joined by single spaces.
fn word_key(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A format-specific lap extraction strategy.
pub trait LapExtractor: Send + Sync {
    /// Stable identifier reported in extraction results.
    fn name(&self) -> &'static str;

    /// Laps found in the document, in discovery order. Empty when the
    /// layout is not recognised.
    fn extract(&self, doc: &Document) -> Vec<LapRecord>;

    fn extract_text(&self, text: &str) -> Vec<LapRecord> {
        self.extract(&Document::new(text))
    }
}

/// All extractors, most specific first.
pub fn default_extractors() -> Vec<Box<dyn LapExtractor>> {
    vec![
        Box::new(DetailedLapTableExtractor),
        Box::new(GenericHtmlTableExtractor),
        Box::new(SequentialSingleDriverExtractor),
        Box::new(SpanishDetailedResultsExtractor),
        Box::new(LooseLineHeuristicExtractor),
    ]
}

/// First lap time in a line: byte offset where it starts, and its seconds.
pub(crate) fn find_time(text: &str) -> Option<(usize, f64)> {
    let m = TIME_IN_TEXT_RE.captures(text)?.get(1)?;
    Some((m.start(), parse_lap_time(m.as_str())))
}

/// Seconds in a table cell holding a lap time, possibly decorated
/// (`34.500 *`). Cells with words in them are not time cells.
pub(crate) fn cell_time(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    if is_lap_time(cell) {
        return Some(parse_lap_time(cell));
    }
    if cell.chars().any(char::is_alphabetic) {
        return None;
    }
    find_time(cell).map(|(_, t)| t)
}

/// A bare integer in `1..=MAX_SMALL_INT`, optionally followed by a dot.
pub(crate) fn small_int(text: &str) -> Option<u32> {
    let text = text.trim();
    let digits = text.strip_suffix('.').unwrap_or(text);
    if digits.is_empty() || digits.len() > 3 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    (1..=MAX_SMALL_INT).contains(&n).then_some(n)
}

fn first_word(text: &str) -> String {
    text.split_whitespace()
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '/')
        .to_lowercase()
}

/// Column labels and summary lines ("Best lap", "Avg.", "Lap 3").
pub(crate) fn is_label(text: &str) -> bool {
    let lowered = text.trim().trim_end_matches(|c: char| c == '.' || c == ':').to_lowercase();
    NON_NAME_WORDS.contains(&lowered.as_str()) || SUMMARY_LEADS.contains(&first_word(text).as_str())
}

/// Plausibly a driver name: long enough, mostly letters, not a label or a time.
pub(crate) fn is_name_like(text: &str) -> bool {
    let text = text.trim();
    if text.chars().count() < MIN_DRIVER_NAME_LEN || is_lap_time(text) || is_label(text) {
        return false;
    }
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let letters = visible.iter().filter(|c| c.is_alphabetic()).count();
    letters >= 2 && letters * 2 >= visible.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_time() {
        let (start, t) = find_time("Driver 1: 30.456").unwrap();
        assert_eq!(start, 10);
        assert!((t - 30.456).abs() < 1e-9);
        let (start, t) = find_time("1. Alice 1:02.345 (+0.3)").unwrap();
        assert_eq!(start, 9);
        assert!((t - 62.345).abs() < 1e-9);
        assert_eq!(find_time("IP 192.168.1234"), None);
        assert_eq!(find_time("07/11/2025 12:48"), None);
        assert_eq!(find_time(""), None);
    }

    #[test]
    fn test_cell_time() {
        assert_eq!(cell_time(" 34.500 "), Some(34.5));
        assert_eq!(cell_time("34.500 *"), Some(34.5));
        assert_eq!(cell_time("Lap 34.500"), None);
        assert_eq!(cell_time("-"), None);
    }

    #[test]
    fn test_small_int() {
        assert_eq!(small_int("7"), Some(7));
        assert_eq!(small_int(" 12. "), Some(12));
        assert_eq!(small_int("0"), None);
        assert_eq!(small_int("1000"), None);
        assert_eq!(small_int("1a"), None);
        assert_eq!(small_int("."), None);
    }

    #[test]
    fn test_name_heuristics() {
        assert!(is_name_like("Max van Lierop"));
        assert!(is_name_like("Driver 1"));
        assert!(is_name_like("Zoë"));
        assert!(!is_name_like("Al"));
        assert!(!is_name_like("Best lap"));
        assert!(!is_name_like("Avg."));
        assert!(!is_name_like("Lap 1"));
        assert!(!is_name_like("34.500"));
        assert!(!is_name_like("TB 2901"));
        assert!(is_label("Naam"));
        assert!(is_label("Ronde"));
        assert!(!is_label("Alice"));
    }

    #[test]
    fn test_document_lines() {
        let doc = Document::new("  Alice  \n\n 1\t34.500 \n");
        assert!(!doc.is_html());
        assert_eq!(doc.lines(), &["Alice".to_string(), "1\t34.500".to_string()]);
        assert_eq!(doc.plain_text(), "Alice\n1\t34.500");

        let doc = Document::new("<p>Alice</p><p>34.500</p>");
        assert!(doc.is_html());
        assert_eq!(doc.lines().len(), 2);
        assert!(doc.source().starts_with("<p>"));
    }

    #[test]
    fn test_mentions_venue() {
        let doc = Document::new("");
        assert!(doc.mentions_venue("De Voltage"));
        assert!(doc.mentions_venue("Welkom bij Fastkart Elche!"));
        assert!(doc.mentions_venue("EXPERIENCE_FACTORY"));
        assert!(!doc.mentions_venue("Max van Lierop"));
        // Whole words only.
        assert!(!doc.mentions_venue("Rik Melchers"));

        let doc = Document::with_venues("", &["Home Track"]);
        assert!(doc.mentions_venue("home track"));
        assert!(!doc.mentions_venue("De Voltage"));
    }

    #[test]
    fn test_default_order() {
        let names: Vec<&str> = default_extractors().iter().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "detailed_lap_table",
                "generic_html_table",
                "sequential_single_driver",
                "spanish_detailed_results",
                "loose_line_heuristic",
            ]
        );
    }
}
