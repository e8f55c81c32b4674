//! Multi-driver "Detailed results" grids.
//!
//! After a section marker comes a header row naming one driver per column,
//! then one row per lap: the lap number followed by each driver's time.
//! The grid ends at an averages/history row. SMS-Timing style mails send
//! this as an HTML table; forwarded copies flatten it to tab- or
//! space-separated text, which is handled the same way.

use kartlog_core::LapRecord;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{cell_time, html, is_label, small_int, Document, LapExtractor};

static MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:detailed\s+results|jouw\s+rondetijden)\b").unwrap());
static END_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:avg|hist|gem)\b").unwrap());
static SPACE_COLUMNS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

pub struct DetailedLapTableExtractor;

impl LapExtractor for DetailedLapTableExtractor {
    fn name(&self) -> &'static str {
        "detailed_lap_table"
    }

    fn extract(&self, doc: &Document) -> Vec<LapRecord> {
        let mut rows = if doc.is_html() {
            html_section_rows(doc.source())
        } else {
            Vec::new()
        };
        if rows.is_empty() {
            rows = text_section_rows(doc.lines());
        }
        grid_to_laps(&rows)
    }
}

fn html_section_rows(source: &str) -> Vec<Vec<String>> {
    let Some(marker) = MARKER_RE.find(source) else {
        return Vec::new();
    };
    html::table_rows(&source[marker.end()..])
        .into_iter()
        .take_while(|row| !is_end_row(row))
        .collect()
}

fn text_section_rows(lines: &[String]) -> Vec<Vec<String>> {
    let Some(start) = lines.iter().position(|l| MARKER_RE.is_match(l)) else {
        return Vec::new();
    };
    lines[start + 1..]
        .iter()
        .take_while(|line| !END_ROW_RE.is_match(line))
        .map(|line| split_columns(line))
        .collect()
}

/// Tab-separated rows keep one cell per tab, empty cells included;
/// space-aligned rows split on runs of two or more spaces.
fn split_columns(line: &str) -> Vec<String> {
    let cells: Vec<&str> = if line.contains('\t') {
        line.split('\t').collect()
    } else {
        SPACE_COLUMNS_RE.split(line).collect()
    };
    cells.into_iter().map(|cell| cell.trim().to_string()).collect()
}

fn is_end_row(row: &[String]) -> bool {
    row.iter()
        .find(|cell| !cell.is_empty())
        .map_or(false, |cell| END_ROW_RE.is_match(cell))
}

fn is_lap_row(row: &[String]) -> bool {
    row.first().and_then(|c| small_int(c)).is_some() && row.len() > 1
}

fn is_driver_header(cell: &str) -> bool {
    let cell = cell.trim();
    !cell.is_empty() && cell.chars().any(char::is_alphabetic) && !is_label(cell)
}

/// Header row: names driver columns, holds no times, and is directly
/// followed by a lap row.
fn find_header(rows: &[Vec<String>]) -> Option<usize> {
    (0..rows.len()).find(|&i| {
        let row = &rows[i];
        row.iter().any(|c| is_driver_header(c))
            && row.iter().all(|c| cell_time(c).is_none())
            && rows.get(i + 1).map_or(false, |next| is_lap_row(next))
    })
}

fn grid_to_laps(rows: &[Vec<String>]) -> Vec<LapRecord> {
    let Some(header_idx) = find_header(rows) else {
        return Vec::new();
    };

    // Column 0 holds lap numbers; flattened text loses the blank corner cell.
    let mut header = rows[header_idx].clone();
    if header.first().map_or(false, |c| is_driver_header(c)) {
        header.insert(0, String::new());
    }

    let columns: Vec<(usize, &str)> = header
        .iter()
        .enumerate()
        .skip(1)
        .filter(|(_, name)| is_driver_header(name))
        .map(|(col, name)| (col, name.trim()))
        .collect();

    let mut per_driver: Vec<Vec<LapRecord>> = vec![Vec::new(); columns.len()];
    for row in &rows[header_idx + 1..] {
        let Some(lap) = row.first().and_then(|c| small_int(c)) else {
            continue;
        };
        for (slot, (col, name)) in columns.iter().enumerate() {
            let time = row.get(*col).and_then(|c| cell_time(c));
            if let Some(record) = time.and_then(|t| LapRecord::new(name, Some(lap), t)) {
                per_driver[slot].push(record);
            }
        }
    }

    per_driver
        .into_iter()
        .filter(|laps| !laps.is_empty())
        .enumerate()
        .flat_map(|(rank, laps)| {
            laps.into_iter()
                .map(move |lap| lap.with_position(Some(rank as u32 + 1)))
        })
        .collect()
}
