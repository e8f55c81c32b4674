//! Runtime configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Country assumed for tracks whose catalog entry carries none.
pub const DEFAULT_COUNTRY: &str = "Netherlands";

/// Default half-width of the duplicate-session window, in minutes.
pub const DEFAULT_DUPLICATE_WINDOW_MINUTES: i64 = 120;

/// Top-level Kartlog configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KartlogConfig {
    /// JSON track catalog replacing the built-in one (`KARTLOG_TRACKS`).
    pub tracks_file: Option<PathBuf>,
    /// Country reported for tracks without one (`KARTLOG_DEFAULT_COUNTRY`).
    #[serde(default = "default_country")]
    pub default_country: String,
    /// Sessions at the same track closer than this are flagged as possible
    /// duplicates (`KARTLOG_DUPLICATE_WINDOW_MINUTES`).
    #[serde(default = "default_window")]
    pub duplicate_window_minutes: i64,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_window() -> i64 {
    DEFAULT_DUPLICATE_WINDOW_MINUTES
}

impl Default for KartlogConfig {
    fn default() -> Self {
        Self {
            tracks_file: None,
            default_country: default_country(),
            duplicate_window_minutes: default_window(),
        }
    }
}

impl KartlogConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let tracks_file = lookup("KARTLOG_TRACKS")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        let default_country = lookup("KARTLOG_DEFAULT_COUNTRY")
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_country);

        let duplicate_window_minutes = match lookup("KARTLOG_DUPLICATE_WINDOW_MINUTES") {
            Some(raw) => {
                let minutes: i64 = raw.trim().parse().map_err(|_| {
                    Error::Config(format!(
                        "KARTLOG_DUPLICATE_WINDOW_MINUTES must be a whole number, got {:?}",
                        raw
                    ))
                })?;
                if minutes < 0 {
                    return Err(Error::Config(
                        "KARTLOG_DUPLICATE_WINDOW_MINUTES must not be negative".into(),
                    ));
                }
                minutes
            }
            None => default_window(),
        };

        Ok(Self {
            tracks_file,
            default_country,
            duplicate_window_minutes,
        })
    }

    pub fn duplicate_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.duplicate_window_minutes)
    }
}
