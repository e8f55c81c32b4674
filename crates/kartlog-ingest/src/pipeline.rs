//! Extraction pipeline: raw upload → decoded text → laps + session metadata.

use std::sync::Arc;

use kartlog_core::{ExtractionResult, LapRecord, SessionInfo};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::extract::{default_extractors, Document, LapExtractor};
use crate::metadata;
use crate::mime::{bytes_to_text, DecodedHeaders, MessageDecoder};
use crate::track::TrackCatalog;

/// Characters of the body searched for track names.
pub const TRACK_SEARCH_PREFIX: usize = 20_000;

/// Turns one uploaded result file into an [`ExtractionResult`].
///
/// Stateless apart from the shared catalog and extractor list, so one
/// pipeline can serve concurrent uploads.
pub struct ExtractionPipeline {
    catalog: Arc<TrackCatalog>,
    venues: Vec<String>,
    extractors: Vec<Box<dyn LapExtractor>>,
}

impl ExtractionPipeline {
    pub fn new(catalog: Arc<TrackCatalog>) -> Self {
        Self::with_extractors(catalog, default_extractors())
    }

    /// Use a custom extractor list, tried in the given order.
    pub fn with_extractors(
        catalog: Arc<TrackCatalog>,
        extractors: Vec<Box<dyn LapExtractor>>,
    ) -> Self {
        let venues = catalog.venue_terms();
        Self {
            catalog,
            venues,
            extractors,
        }
    }

    pub fn catalog(&self) -> &TrackCatalog {
        &self.catalog
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    /// Extract laps and session metadata, identifying the track from the
    /// filename, headers and body.
    pub fn extract(&self, raw: &[u8], filename: Option<&str>) -> ExtractionResult {
        self.run(raw, filename, None)
    }

    /// Extract with a track the caller already knows; no identification.
    pub fn extract_for_track(
        &self,
        raw: &[u8],
        filename: Option<&str>,
        track: &str,
    ) -> ExtractionResult {
        self.run(raw, filename, Some(track))
    }

    fn run(&self, raw: &[u8], filename: Option<&str>, explicit_track: Option<&str>) -> ExtractionResult {
        let message = MessageDecoder::decode(raw);
        let body = if message.headers.looks_like_message() && !message.body.trim().is_empty() {
            message.body
        } else {
            debug!("Input has no email headers, treating it as plain text");
            bytes_to_text(raw)
        };
        let doc = Document::with_venues(&body, &self.venues);

        let detected_track_name = match explicit_track.map(str::trim).filter(|t| !t.is_empty()) {
            Some(name) => Some(
                self.catalog
                    .find(name)
                    .map(|t| t.canonical_name.clone())
                    .unwrap_or_else(|| name.to_string()),
            ),
            None => self.identify_track(filename, &message.headers, &body),
        };

        let plain = doc.plain_text();
        let (detected_date, detected_time) = match metadata::detect_date(&plain) {
            Some((date, time)) => (Some(date), time),
            None => (
                message.headers.date().and_then(metadata::date_from_header),
                None,
            ),
        };
        let session_number = metadata::detect_session_number(&plain);

        let (laps, extractor) = self.run_extractors(&doc);

        let result = ExtractionResult {
            session_info: SessionInfo {
                detected_date,
                detected_time,
                detected_track_name,
                session_number,
            },
            laps,
            extractor: extractor.map(str::to_string),
            content_hash: content_hash(raw),
        };

        match &result.extractor {
            Some(name) => info!(
                "Extracted {} laps for {} drivers via {} (track: {})",
                result.laps.len(),
                result.driver_names().len(),
                name,
                result
                    .session_info
                    .detected_track_name
                    .as_deref()
                    .unwrap_or("unknown")
            ),
            None => info!(
                "No lap data found in {}",
                filename.unwrap_or("upload")
            ),
        }
        result
    }

    fn identify_track(
        &self,
        filename: Option<&str>,
        headers: &DecodedHeaders,
        body: &str,
    ) -> Option<String> {
        let body_prefix: String = body.chars().take(TRACK_SEARCH_PREFIX).collect();
        let haystacks = [
            filename.unwrap_or(""),
            headers.subject().unwrap_or(""),
            headers.from().unwrap_or(""),
            body_prefix.as_str(),
        ];
        self.catalog
            .identify(&haystacks)
            .map(|t| t.canonical_name.clone())
    }

    fn run_extractors(&self, doc: &Document) -> (Vec<LapRecord>, Option<&'static str>) {
        for extractor in &self.extractors {
            let laps = extractor.extract(doc);
            debug!("Extractor {} found {} laps", extractor.name(), laps.len());
            if !laps.is_empty() {
                return (laps, Some(extractor.name()));
            }
        }
        (Vec::new(), None)
    }
}

/// Compute SHA-256 content hash.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
