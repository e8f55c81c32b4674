//! JSON report printed by `kartlog parse`.

use kartlog_core::{ExtractionResult, Result, SessionInfo};
use kartlog_ingest::TrackCatalog;
use kartlog_session::{
    validate, DriverSummary, DuplicateSessionChecker, DuplicateWarning, LapStats,
    SessionCalculator, SessionIndex,
};
use serde::Serialize;

/// Shown when no extractor recognised the upload.
pub const NO_LAP_DATA_MESSAGE: &str = "Could not detect lap data, please enter manually";

#[derive(Debug, Clone, Serialize)]
pub struct TrackSummary {
    pub name: String,
    pub city: Option<String>,
    pub country: String,
    pub distance_m: Option<u32>,
    /// Whether the name is in the track catalog.
    pub known: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateNotice {
    #[serde(flatten)]
    pub warning: DuplicateWarning,
    pub message: String,
}

impl From<DuplicateWarning> for DuplicateNotice {
    fn from(warning: DuplicateWarning) -> Self {
        let message = warning.message();
        Self { warning, message }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ParseReport {
    pub file: Option<String>,
    pub track: Option<TrackSummary>,
    pub session: SessionInfo,
    pub extractor: Option<String>,
    pub content_hash: String,
    pub drivers: Vec<DriverSummary>,
    pub laps: Vec<LapStats>,
    pub duplicates: Vec<DuplicateNotice>,
}

impl ParseReport {
    /// Validate an extraction result and compute everything the report shows.
    ///
    /// Fails with `Error::NoLapData` when nothing was extracted. Duplicate
    /// warnings need an index; the date check also needs a detected track
    /// and date, while the same-file check only needs the content hash.
    pub fn build(
        result: &ExtractionResult,
        file: Option<&str>,
        catalog: &TrackCatalog,
        duplicates: Option<(&DuplicateSessionChecker, &dyn SessionIndex)>,
    ) -> Result<Self> {
        validate(result)?;

        let info = &result.session_info;
        let track = info
            .detected_track_name
            .as_deref()
            .map(|name| track_summary(catalog, name));
        let distance = track.as_ref().and_then(|t| t.distance_m);

        let laps = SessionCalculator::calculate(&result.laps, distance);
        let drivers = SessionCalculator::summarize(&laps);

        let warnings = match duplicates {
            Some((checker, index)) => match (info.detected_track_name.as_deref(), info.detected_date) {
                (Some(track_name), Some(date)) => checker.check_upload(
                    index,
                    &result.content_hash,
                    track_name,
                    date,
                    info.detected_time,
                )?,
                _ => checker
                    .check_file(index, &result.content_hash)?
                    .into_iter()
                    .collect(),
            },
            None => Vec::new(),
        };

        Ok(Self {
            file: file.map(str::to_string),
            track,
            session: info.clone(),
            extractor: result.extractor.clone(),
            content_hash: result.content_hash.clone(),
            drivers,
            laps,
            duplicates: warnings.into_iter().map(DuplicateNotice::from).collect(),
        })
    }
}

fn track_summary(catalog: &TrackCatalog, name: &str) -> TrackSummary {
    match catalog.find(name) {
        Some(track) => TrackSummary {
            name: track.canonical_name.clone(),
            city: track.city.clone(),
            country: catalog.get_country(&track.canonical_name).to_string(),
            distance_m: track.distance_m,
            known: true,
        },
        None => TrackSummary {
            name: name.to_string(),
            city: None,
            country: catalog.default_country().to_string(),
            distance_m: None,
            known: false,
        },
    }
}
