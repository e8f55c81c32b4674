//! Per-lap session statistics: best laps, gaps, intervals, positions, speed.

use std::collections::BTreeMap;

use kartlog_core::time;
use kartlog_core::LapRecord;
use serde::Serialize;
use tracing::info;

use crate::prepare::{group_by_driver, DriverLaps};

/// Statistics for one lap, relative to its driver and to the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapStats {
    pub driver_name: String,
    pub lap_number: u32,
    pub lap_time: f64,
    pub kart_number: Option<String>,
    pub is_best_lap: bool,
    /// Seconds slower than the driver's best lap.
    pub gap_to_best: f64,
    /// Change from the driver's previous lap; `None` on the first lap.
    pub interval: Option<f64>,
    /// Seconds behind the next-faster driver on the same lap number;
    /// `None` for the fastest.
    pub gap_to_previous: Option<f64>,
    /// Session rank of the driver's best lap.
    pub position: u32,
    pub avg_speed_kph: Option<f64>,
}

/// One driver's session at a glance.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSummary {
    pub driver_name: String,
    pub kart_number: Option<String>,
    pub position: u32,
    pub lap_count: usize,
    pub best_lap: f64,
    pub average_lap: f64,
}

/// Post-processing over a session's laps.
pub struct SessionCalculator;

impl SessionCalculator {
    /// Compute [`LapStats`] for every lap.
    ///
    /// Drivers are grouped as in [`group_by_driver`] and keep their order of
    /// appearance; each driver's laps are sorted by lap number. Laps without
    /// a number are numbered by their order within the driver's laps.
    pub fn calculate(laps: &[LapRecord], track_distance_m: Option<u32>) -> Vec<LapStats> {
        let groups = group_by_driver(laps);
        let positions = rank_drivers(&groups);

        let mut stats: Vec<LapStats> = Vec::with_capacity(laps.len());
        for (group, position) in groups.iter().zip(positions) {
            let mut numbered: Vec<(u32, &LapRecord)> = group
                .laps
                .iter()
                .enumerate()
                .map(|(i, lap)| (lap.lap_number.unwrap_or(i as u32 + 1), lap))
                .collect();
            numbered.sort_by_key(|(number, _)| *number);

            let best = group.best_lap().unwrap_or(0.0);
            let mut previous: Option<f64> = None;
            for (number, lap) in numbered {
                stats.push(LapStats {
                    driver_name: group.driver_name.clone(),
                    lap_number: number,
                    lap_time: lap.lap_time,
                    kart_number: lap.kart_number.clone().or_else(|| group.kart_number.clone()),
                    is_best_lap: lap.lap_time == best,
                    gap_to_best: round_to(lap.lap_time - best, 3),
                    interval: previous.map(|p| round_to(lap.lap_time - p, 3)),
                    gap_to_previous: None,
                    position,
                    avg_speed_kph: track_distance_m.map(|d| average_speed(d, lap.lap_time)),
                });
                previous = Some(lap.lap_time);
            }
        }

        fill_gaps_to_previous(&mut stats);

        info!(
            "Calculated statistics for {} laps of {} drivers",
            stats.len(),
            groups.len()
        );
        stats
    }

    /// Per-driver summary of calculated laps, ordered by position.
    pub fn summarize(stats: &[LapStats]) -> Vec<DriverSummary> {
        let mut order: Vec<&str> = Vec::new();
        let mut by_driver: BTreeMap<&str, Vec<&LapStats>> = BTreeMap::new();
        for lap in stats {
            let entry = by_driver.entry(lap.driver_name.as_str()).or_default();
            if entry.is_empty() {
                order.push(lap.driver_name.as_str());
            }
            entry.push(lap);
        }

        let mut summaries: Vec<DriverSummary> = order
            .into_iter()
            .filter_map(|name| {
                let laps = by_driver.get(name)?;
                let first = laps.first()?;
                let times: Vec<f64> = laps.iter().map(|l| l.lap_time).collect();
                Some(DriverSummary {
                    driver_name: name.to_string(),
                    kart_number: first.kart_number.clone(),
                    position: first.position,
                    lap_count: laps.len(),
                    best_lap: time::fastest(&times)?,
                    average_lap: round_to(time::average(&times)?, 3),
                })
            })
            .collect();
        summaries.sort_by_key(|s| s.position);
        summaries
    }
}

/// 1-based rank of each group's best lap; ties keep appearance order.
fn rank_drivers(groups: &[DriverLaps]) -> Vec<u32> {
    let mut order: Vec<usize> = (0..groups.len()).collect();
    order.sort_by(|&a, &b| {
        let a = groups[a].best_lap().unwrap_or(f64::MAX);
        let b = groups[b].best_lap().unwrap_or(f64::MAX);
        a.total_cmp(&b)
    });

    let mut positions = vec![0u32; groups.len()];
    for (rank, idx) in order.into_iter().enumerate() {
        positions[idx] = rank as u32 + 1;
    }
    positions
}

fn fill_gaps_to_previous(stats: &mut [LapStats]) {
    let mut by_lap: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (idx, lap) in stats.iter().enumerate() {
        by_lap.entry(lap.lap_number).or_default().push(idx);
    }

    for mut indices in by_lap.into_values() {
        indices.sort_by(|&a, &b| stats[a].lap_time.total_cmp(&stats[b].lap_time));
        for pair in indices.windows(2) {
            let gap = stats[pair[1]].lap_time - stats[pair[0]].lap_time;
            stats[pair[1]].gap_to_previous = Some(round_to(gap, 3));
        }
    }
}

fn average_speed(distance_m: u32, lap_time: f64) -> f64 {
    round_to(distance_m as f64 / lap_time * 3.6, 2)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
