//! Kartlog Core: shared data model, lap-time codec, configuration, errors.

pub mod config;
pub mod error;
pub mod time;
pub mod types;

pub use config::KartlogConfig;
pub use error::{Error, Result};
pub use types::{ExtractionResult, LapRecord, SessionInfo, TrackPattern};
