//! Session-level metadata found in decoded text: date, start time, session number.

use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})").unwrap());
static DOTTED_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})\.(\d{2})\.(\d{4})\b").unwrap());
static SLASHED_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{2})/(\d{2})/(\d{4})\b").unwrap());
/// A clock time directly after a date: `T12:48`, ` 12:48`, ` At 12:48`, ` om 19:30`.
static TIME_AFTER_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:T|\s*,?\s*(?:(?i:at|om|um|a\s+las)\s+)?)(\d{1,2}):(\d{2})\b").unwrap()
});
static SESSION_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:sessie|sesi[oó]n|session|heat)\s*(?:#|nr\.?|no\.?)?\s*(\d{1,4})\b")
        .unwrap()
});

#[derive(Clone, Copy)]
enum FieldOrder {
    YearMonthDay,
    DayMonthYear,
}

/// First valid date in the text, trying ISO, then `DD.MM.YYYY`, then
/// `DD/MM/YYYY`, with the clock time printed right after it if any.
pub fn detect_date(text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let patterns: [(&Regex, FieldOrder); 3] = [
        (&*ISO_DATE_RE, FieldOrder::YearMonthDay),
        (&*DOTTED_DATE_RE, FieldOrder::DayMonthYear),
        (&*SLASHED_DATE_RE, FieldOrder::DayMonthYear),
    ];

    for (re, order) in patterns {
        for caps in re.captures_iter(text) {
            let Some(date) = build_date(&caps, order) else {
                continue;
            };
            let end = caps.get(0).map_or(0, |m| m.end());
            return Some((date, time_after(&text[end..])));
        }
    }
    None
}

fn build_date(caps: &Captures, order: FieldOrder) -> Option<NaiveDate> {
    let a: u32 = caps[1].parse().ok()?;
    let b: u32 = caps[2].parse().ok()?;
    let c: u32 = caps[3].parse().ok()?;
    match order {
        FieldOrder::YearMonthDay => NaiveDate::from_ymd_opt(a as i32, b, c),
        FieldOrder::DayMonthYear => NaiveDate::from_ymd_opt(c as i32, b, a),
    }
}

fn time_after(rest: &str) -> Option<NaiveTime> {
    let caps = TIME_AFTER_DATE_RE.captures(rest)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps[2].parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Date of an RFC 2822 `Date:` header value, in the sender's offset.
/// Values chrono rejects go through `mailparse`'s lenient parser, which
/// yields a UTC date.
pub fn date_from_header(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DateTime::parse_from_rfc2822(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| {
            mailparse::dateparse(value)
                .ok()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
                .map(|dt| dt.date_naive())
        })
}

/// `Sessie 4`, `Sesión 17`, `Session #3`, `Heat 2`.
pub fn detect_session_number(text: &str) -> Option<String> {
    SESSION_NUMBER_RE
        .captures(text)
        .map(|caps| caps[1].trim_start_matches('0').to_string())
        .map(|n| if n.is_empty() { "0".to_string() } else { n })
}
