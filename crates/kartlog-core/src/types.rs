//! Data model shared by the extraction pipeline and its callers.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Lap times at or above this many seconds are discarded as implausible.
/// The ceiling is arbitrary; endurance formats with longer laps would need it raised.
pub const MAX_LAP_SECONDS: f64 = 300.0;

/// Minimum number of characters for a string to be taken as a driver name.
/// Also arbitrary, it keeps stray tokens like "P1" out of the name column.
pub const MIN_DRIVER_NAME_LEN: usize = 3;

/// Whether a lap time falls in the plausible range `(0, MAX_LAP_SECONDS)`.
pub fn is_plausible_lap_time(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0 && seconds < MAX_LAP_SECONDS
}

/// One driver's timing for one lap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub driver_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lap_number: Option<u32>,
    /// Lap time in seconds.
    pub lap_time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kart_number: Option<String>,
}

impl LapRecord {
    /// Build a record, trimming the driver name.
    ///
    /// Returns `None` when the name is empty or the time is implausible, so
    /// extractors can push candidates without repeating the checks.
    pub fn new(driver_name: &str, lap_number: Option<u32>, lap_time: f64) -> Option<Self> {
        let driver_name = driver_name.trim();
        if driver_name.is_empty() || !is_plausible_lap_time(lap_time) {
            return None;
        }
        Some(Self {
            driver_name: driver_name.to_string(),
            lap_number,
            lap_time,
            position: None,
            kart_number: None,
        })
    }

    pub fn with_position(mut self, position: Option<u32>) -> Self {
        self.position = position;
        self
    }

    pub fn with_kart(mut self, kart_number: Option<String>) -> Self {
        self.kart_number = kart_number;
        self
    }
}

/// Session-level metadata detected alongside the laps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub detected_date: Option<NaiveDate>,
    /// Start time printed next to the date, when the source has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detected_time: Option<NaiveTime>,
    pub detected_track_name: Option<String>,
    pub session_number: Option<String>,
}

/// Output of one pipeline run. Empty `laps` means no usable data was found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub session_info: SessionInfo,
    /// Laps in discovery order.
    pub laps: Vec<LapRecord>,
    /// Name of the format strategy that produced `laps`.
    pub extractor: Option<String>,
    /// SHA-256 of the raw upload.
    pub content_hash: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.laps.is_empty()
    }

    /// Distinct driver names in order of first appearance.
    pub fn driver_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for lap in &self.laps {
            if !names.contains(&lap.driver_name.as_str()) {
                names.push(&lap.driver_name);
            }
        }
        names
    }
}

/// One venue in the track catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPattern {
    pub canonical_name: String,
    /// Lower-case substrings that identify the venue.
    pub match_patterns: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Lap distance in metres, used for average speed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<u32>,
}
