//! Results tables with one row per driver (position, kart, name, best lap).

use kartlog_core::LapRecord;

use super::{cell_time, html, is_name_like, small_int, spanish, Document, LapExtractor};

/// Reads any `<tr>` whose cells include a driver-like name and a lap time.
///
/// Integer cells are position then kart number, in column order; further
/// integers (lap counts) are ignored. Such tables list best laps, so
/// records carry no lap number. Mails with the Spanish results markers
/// are left to their own extractor.
pub struct GenericHtmlTableExtractor;

impl LapExtractor for GenericHtmlTableExtractor {
    fn name(&self) -> &'static str {
        "generic_html_table"
    }

    fn extract(&self, doc: &Document) -> Vec<LapRecord> {
        if !doc.is_html() || spanish::has_markers(&doc.plain_text()) {
            return Vec::new();
        }
        html::table_rows(doc.source())
            .iter()
            .filter_map(|row| row_to_lap(row))
            .collect()
    }
}

fn row_to_lap(row: &[String]) -> Option<LapRecord> {
    let mut ints: Vec<u32> = Vec::new();
    let mut name: Option<&str> = None;
    let mut time: Option<f64> = None;

    for cell in row.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if time.is_none() {
            if let Some(t) = cell_time(cell) {
                time = Some(t);
                continue;
            }
        }
        if let Some(n) = small_int(cell) {
            ints.push(n);
            continue;
        }
        if name.is_none() && is_name_like(cell) {
            name = Some(cell);
        }
    }

    let record = LapRecord::new(name?, None, time?)?;
    Some(
        record
            .with_position(ints.first().copied())
            .with_kart(ints.get(1).map(|k| k.to_string())),
    )
}
