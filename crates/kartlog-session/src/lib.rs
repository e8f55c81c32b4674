//! Session preparation: sanitize, validate, group, calculate, dedupe.
//!
//! Everything a store needs to turn an extraction result into a session,
//! without touching the store itself.

pub mod calculator;
pub mod duplicate;
pub mod prepare;
pub mod sanitize;

pub use calculator::{DriverSummary, LapStats, SessionCalculator};
pub use duplicate::{
    DuplicateReason, DuplicateSessionChecker, DuplicateWarning, ExistingSession,
    InMemorySessionIndex, SessionIndex,
};
pub use prepare::{group_by_driver, validate, DriverLaps};
pub use sanitize::{sanitize_driver_name, sanitize_kart_number};
