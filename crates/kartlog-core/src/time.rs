//! Lap-time codec: textual lap times to seconds and back.
//!
//! Timing systems print laps as `M:SS.mmm`, `MM:SS.mmm` (`00:35.560`) or
//! bare `SS.mmm` (`39.761`). Parsing never fails; anything unreadable
//! becomes `0.0`, which every consumer rejects as implausible.

/// Parse a textual lap time into seconds. Returns `0.0` when unreadable.
pub fn parse_lap_time(text: &str) -> f64 {
    let trimmed = text.trim();
    if let Some(seconds) = parse_shape(trimmed) {
        return seconds;
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ':' || *c == '.')
        .collect();
    if let Some(seconds) = parse_shape(&cleaned) {
        return seconds;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// `M:SS.mmm`, `MM:SS.mmm`, `S.mmm` or `SS.mmm`.
fn parse_shape(s: &str) -> Option<f64> {
    let (minutes, rest) = match s.split_once(':') {
        Some((m, rest)) => (digits(m, 1, 2)?, rest),
        None => (0, s),
    };
    let (secs, frac) = rest.split_once('.')?;
    let min_sec_digits = if s.contains(':') { 2 } else { 1 };
    let secs = digits(secs, min_sec_digits, 2)?;
    let frac = digits(frac, 3, 3)?;
    Some(minutes as f64 * 60.0 + secs as f64 + frac as f64 / 1000.0)
}

fn digits(s: &str, min: usize, max: usize) -> Option<u32> {
    if s.len() < min || s.len() > max || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render seconds for display: `39.761` below a minute, `1:23.456` above.
pub fn format_lap_time(seconds: f64) -> String {
    let millis = to_millis(seconds.max(0.0));
    let minutes = millis / 60_000;
    let secs = (millis % 60_000) / 1000;
    let frac = millis % 1000;
    if minutes == 0 {
        format!("{}.{:03}", secs, frac)
    } else {
        format!("{}:{:02}.{:03}", minutes, secs, frac)
    }
}

/// Render a signed difference between two lap times, e.g. `+0.342`.
pub fn format_difference(seconds: f64) -> String {
    let sign = if seconds < 0.0 { "-" } else { "+" };
    format!("{}{}", sign, format_lap_time(seconds.abs()))
}

/// Whether `text` is a lap time in one of the strict shapes.
pub fn is_lap_time(text: &str) -> bool {
    parse_shape(text.trim()).is_some()
}

pub fn to_millis(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    (seconds * 1000.0).round() as u64
}

pub fn from_millis(millis: u64) -> f64 {
    millis as f64 / 1000.0
}

pub fn average(times: &[f64]) -> Option<f64> {
    if times.is_empty() {
        return None;
    }
    Some(times.iter().sum::<f64>() / times.len() as f64)
}

pub fn fastest(times: &[f64]) -> Option<f64> {
    times.iter().copied().reduce(f64::min)
}

pub fn slowest(times: &[f64]) -> Option<f64> {
    times.iter().copied().reduce(f64::max)
}
