//! Track catalog and free-text track identification.
//!
//! Venues are recognised by case-insensitive substring matches against
//! filenames, email headers and bodies. Entries are tried in catalog order
//! and the first match wins, so a broad pattern early in the catalog can
//! shadow a later, more specific venue.

use std::path::Path;

use kartlog_core::config::DEFAULT_COUNTRY;
use kartlog_core::{Error, Result, TrackPattern};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Immutable list of known venues. Build once and share by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackCatalog {
    tracks: Vec<TrackPattern>,
    #[serde(default = "default_country")]
    default_country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn track(
    name: &str,
    patterns: &[&str],
    city: &str,
    country: &str,
    distance_m: u32,
) -> TrackPattern {
    TrackPattern {
        canonical_name: name.to_string(),
        match_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        city: Some(city.to_string()),
        country: Some(country.to_string()),
        distance_m: Some(distance_m),
    }
}

impl TrackCatalog {
    /// Build a catalog. Patterns are lower-cased; empty ones are dropped.
    pub fn new(tracks: Vec<TrackPattern>, default_country: impl Into<String>) -> Self {
        let tracks = tracks
            .into_iter()
            .map(|mut t| {
                t.match_patterns = t
                    .match_patterns
                    .iter()
                    .map(|p| p.trim().to_lowercase())
                    .filter(|p| !p.is_empty())
                    .collect();
                t
            })
            .collect();
        Self {
            tracks,
            default_country: default_country.into(),
        }
    }

    /// The venues known out of the box.
    pub fn builtin() -> Self {
        Self::new(
            vec![
                track(
                    "De Voltage",
                    &["devoltage", "de voltage", "karten sessie"],
                    "Tilburg",
                    "Netherlands",
                    450,
                ),
                track(
                    "Experience Factory",
                    &[
                        "experience factory",
                        "experiencefactory",
                        "experience_factory",
                        "antwerp",
                    ],
                    "Antwerp",
                    "Belgium",
                    350,
                ),
                track(
                    "Goodwill Karting",
                    &["goodwill", "goodwillkarting"],
                    "Veenendaal",
                    "Netherlands",
                    600,
                ),
                track(
                    "Circuit Park Berghem",
                    &[
                        "berghem",
                        "circuit park",
                        "circuitpark",
                        "circuitparkberghem",
                        "race overzicht",
                        "jouw rondetijden",
                        "smstiming",
                    ],
                    "Berghem",
                    "Netherlands",
                    1200,
                ),
                track(
                    "Fastkart Elche",
                    &["fastkart", "elche", "resumen de tu carrera"],
                    "Elche",
                    "Spain",
                    1160,
                ),
                track("Lot66", &["lot66", "lot 66"], "Oosterhout", "Netherlands", 325),
                track(
                    "Racing Center Gilesias",
                    &["gilesias", "racing center"],
                    "Gilesias",
                    "Spain",
                    500,
                ),
            ],
            DEFAULT_COUNTRY,
        )
    }

    /// Load a catalog from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!(
                "track catalog {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let parsed: TrackCatalog = serde_json::from_str(&content)?;
        let catalog = Self::new(parsed.tracks, parsed.default_country);
        info!(
            "Loaded {} tracks from {}",
            catalog.tracks.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// The configured catalog file if set, otherwise the built-in catalog.
    pub fn from_config(config: &kartlog_core::KartlogConfig) -> Result<Self> {
        let mut catalog = match &config.tracks_file {
            Some(path) => Self::load(path)?,
            None => Self::builtin(),
        };
        catalog.default_country = config.default_country.clone();
        Ok(catalog)
    }

    pub fn tracks(&self) -> &[TrackPattern] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// First venue (in catalog order) with a pattern contained in any haystack.
    pub fn identify<S: AsRef<str>>(&self, haystacks: &[S]) -> Option<&TrackPattern> {
        let lowered: Vec<String> = haystacks
            .iter()
            .map(|h| h.as_ref().to_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        if lowered.is_empty() {
            return None;
        }

        for track in &self.tracks {
            for pattern in &track.match_patterns {
                if lowered.iter().any(|h| h.contains(pattern.as_str())) {
                    debug!("Track {} matched on {:?}", track.canonical_name, pattern);
                    return Some(track);
                }
            }
        }
        None
    }

    /// Canonical names and match patterns of every venue, lower-cased.
    pub fn venue_terms(&self) -> Vec<String> {
        self.tracks
            .iter()
            .flat_map(|t| {
                std::iter::once(t.canonical_name.to_lowercase())
                    .chain(t.match_patterns.iter().cloned())
            })
            .collect()
    }

    /// Look up a venue by canonical name, case-insensitively.
    pub fn find(&self, canonical_name: &str) -> Option<&TrackPattern> {
        let wanted = canonical_name.trim().to_lowercase();
        self.tracks
            .iter()
            .find(|t| t.canonical_name.to_lowercase() == wanted)
    }

    /// Resolve a user-typed track name: an exact canonical name, else
    /// whatever its text identifies.
    pub fn resolve(&self, name: &str) -> Option<&TrackPattern> {
        self.find(name).or_else(|| self.identify(&[name]))
    }

    pub fn get_city(&self, canonical_name: &str) -> Option<&str> {
        self.find(canonical_name).and_then(|t| t.city.as_deref())
    }

    /// Country of a venue, or the default country when unknown.
    pub fn get_country(&self, canonical_name: &str) -> &str {
        self.find(canonical_name)
            .and_then(|t| t.country.as_deref())
            .unwrap_or(&self.default_country)
    }

    pub fn default_country(&self) -> &str {
        &self.default_country
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
