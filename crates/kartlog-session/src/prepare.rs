//! Validation and per-driver grouping of extracted laps.

use std::collections::HashMap;

use kartlog_core::{Error, ExtractionResult, LapRecord, Result};
use serde::Serialize;
use tracing::debug;

use crate::sanitize::{sanitize_driver_name, sanitize_kart_number};

/// All laps of one driver in a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverLaps {
    /// Spelling of the first record seen for this driver.
    pub driver_name: String,
    pub kart_number: Option<String>,
    pub laps: Vec<LapRecord>,
}

impl DriverLaps {
    pub fn best_lap(&self) -> Option<f64> {
        self.laps.iter().map(|l| l.lap_time).reduce(f64::min)
    }
}

/// Reject results the store cannot persist.
///
/// Errors with [`Error::NoLapData`] for an empty lap list and
/// [`Error::InvalidLap`] for the first lap with a blank driver name or a
/// time that is not positive.
pub fn validate(result: &ExtractionResult) -> Result<()> {
    if result.laps.is_empty() {
        return Err(Error::NoLapData);
    }
    for (index, lap) in result.laps.iter().enumerate() {
        if sanitize_driver_name(&lap.driver_name).is_empty() {
            return Err(Error::InvalidLap {
                index,
                reason: "driver name is empty".into(),
            });
        }
        if lap.lap_time.is_nan() || lap.lap_time <= 0.0 {
            return Err(Error::InvalidLap {
                index,
                reason: format!("lap time {} is not positive", lap.lap_time),
            });
        }
    }
    Ok(())
}

/// Group laps by driver, matching names case-insensitively after
/// sanitizing. Drivers keep the order in which they were first seen, and
/// the first kart number seen for a driver is kept.
pub fn group_by_driver(laps: &[LapRecord]) -> Vec<DriverLaps> {
    let mut groups: Vec<DriverLaps> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for lap in laps {
        let name = sanitize_driver_name(&lap.driver_name);
        if name.is_empty() {
            continue;
        }
        let kart = lap.kart_number.as_deref().and_then(sanitize_kart_number);
        let mut record = lap.clone();
        record.driver_name = name.clone();
        record.kart_number = kart.clone();

        let key = name.to_lowercase();
        match index.get(&key) {
            Some(&slot) => {
                let group = &mut groups[slot];
                record.driver_name = group.driver_name.clone();
                if group.kart_number.is_none() {
                    group.kart_number = kart;
                }
                group.laps.push(record);
            }
            None => {
                index.insert(key, groups.len());
                groups.push(DriverLaps {
                    driver_name: name,
                    kart_number: kart,
                    laps: vec![record],
                });
            }
        }
    }

    debug!("Grouped {} laps into {} drivers", laps.len(), groups.len());
    groups
}
