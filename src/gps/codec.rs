// src/gps/codec.rs
//! Conversions for the NMEA degree-minute and HHMMSS field encodings

use chrono::{Duration, NaiveTime};

/// Hours added to the sentence's UTC time-of-day when no offset is configured
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 7;

/// Sentinel for a time field that could not be decoded
pub const UNKNOWN_TIME: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    /// South and West are reported as negative decimal degrees
    pub fn is_negative(self) -> bool {
        matches!(self, Hemisphere::South | Hemisphere::West)
    }
}

/// Convert a `DDDMM.MMMM` coordinate into signed decimal degrees.
///
/// Returns `None` for empty, non-numeric, negative or non-finite input. An
/// unrecognized hemisphere leaves the value positive. The result is rounded
/// to 6 decimal places.
pub fn decimal_from_encoded(value: &str, hemisphere: &str) -> Option<f64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let encoded = value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)?;

    let degrees = (encoded / 100.0).floor();
    let minutes = encoded % 100.0;
    let decimal = round_to_micro_degrees(degrees + minutes / 60.0);

    match Hemisphere::parse(hemisphere) {
        Some(h) if h.is_negative() => Some(-decimal),
        _ => Some(decimal),
    }
}

fn round_to_micro_degrees(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

/// Convert an `HHMMSS[.sss]` time into `HH:MM:SS` shifted by `offset_hours`.
///
/// Fractional seconds are dropped and short values are left-padded with
/// zeros. A leap second (`SS` = 60) is kept as `:60` after the shift.
/// Anything else that is not a valid time of day yields [`UNKNOWN_TIME`].
pub fn time_of_day_from_encoded(value: &str, offset_hours: i32) -> String {
    let whole = value.trim().split('.').next().unwrap_or("");
    if whole.is_empty() || whole.len() > 6 || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return UNKNOWN_TIME.to_string();
    }

    let padded = format!("{:0>6}", whole);
    let component = |range: std::ops::Range<usize>| padded[range].parse::<u32>().ok();

    let (time, leap_second) = match (component(0..2), component(2..4), component(4..6)) {
        (Some(h), Some(m), Some(60)) => (NaiveTime::from_hms_opt(h, m, 59), true),
        (Some(h), Some(m), Some(s)) => (NaiveTime::from_hms_opt(h, m, s), false),
        _ => (None, false),
    };

    match time {
        Some(time) => {
            // Whole-hour shifts leave minutes and seconds untouched
            let (shifted, _) =
                time.overflowing_add_signed(Duration::hours(i64::from(offset_hours)));
            if leap_second {
                format!("{}:60", shifted.format("%H:%M"))
            } else {
                shifted.format("%H:%M:%S").to_string()
            }
        }
        None => UNKNOWN_TIME.to_string(),
    }
}
