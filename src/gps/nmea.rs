// src/gps/nmea.rs
//! NMEA sentence decoding

use super::codec::{decimal_from_encoded, time_of_day_from_encoded, DEFAULT_UTC_OFFSET_HOURS};
use super::data::{Fix, FixDetail, FixStatus};

const RMC_TAG: &str = "$GPRMC";
const GGA_TAG: &str = "$GPGGA";

/// Decodes multi-line NMEA payloads into a single [`Fix`]
#[derive(Debug, Clone, Copy)]
pub struct SentenceDecoder {
    offset_hours: i32,
}

impl Default for SentenceDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_UTC_OFFSET_HOURS)
    }
}

impl SentenceDecoder {
    pub fn new(offset_hours: i32) -> Self {
        Self { offset_hours }
    }

    /// Decode every line of `payload`.
    ///
    /// Each recognized sentence replaces the fix decoded so far, so only the
    /// last `$GPRMC` or `$GPGGA` line in the payload survives. Returns `None`
    /// when no line carries a recognized tag.
    pub fn decode(&self, payload: &str) -> Option<Fix> {
        let mut fix = None;

        for line in payload.lines() {
            if let Some(decoded) = self.decode_sentence(line) {
                fix = Some(decoded);
            }
        }

        fix
    }

    /// Decode a single sentence, ignoring unrecognized tags.
    ///
    /// The tag must be the whole first field; a checksum is only stripped
    /// from the last field, after the tag matched.
    pub fn decode_sentence(&self, line: &str) -> Option<Fix> {
        let mut parts: Vec<&str> = line.trim().split(',').map(str::trim).collect();
        let is_rmc = match parts.first().copied() {
            Some(RMC_TAG) => true,
            Some(GGA_TAG) => false,
            _ => return None,
        };

        if parts.len() > 1 {
            if let Some(last) = parts.last_mut() {
                *last = strip_checksum(last);
            }
        }

        if is_rmc {
            Some(self.parse_gprmc(&parts))
        } else {
            Some(self.parse_gpgga(&parts))
        }
    }

    /// Parse GPRMC (Recommended Minimum Course) sentence
    fn parse_gprmc(&self, parts: &[&str]) -> Fix {
        let date = match field(parts, 9) {
            "" => "unknown".to_string(),
            raw => raw.to_string(),
        };

        Fix::new(
            time_of_day_from_encoded(field(parts, 1), self.offset_hours),
            decimal_from_encoded(field(parts, 3), field(parts, 4)),
            decimal_from_encoded(field(parts, 5), field(parts, 6)),
            FixDetail::Rmc {
                status: FixStatus::from_flag(field(parts, 2)),
                speed_knots: non_negative_or_zero(field(parts, 7)),
                course: non_negative_or_zero(field(parts, 8)),
                date,
            },
        )
    }

    /// Parse GPGGA (Global Positioning System Fix Data) sentence
    fn parse_gpgga(&self, parts: &[&str]) -> Fix {
        // Field 8 is HDOP, which the relay does not carry
        let altitude = field(parts, 9)
            .parse::<f64>()
            .ok()
            .filter(|alt| alt.is_finite())
            .unwrap_or(0.0);

        Fix::new(
            time_of_day_from_encoded(field(parts, 1), self.offset_hours),
            decimal_from_encoded(field(parts, 2), field(parts, 3)),
            decimal_from_encoded(field(parts, 4), field(parts, 5)),
            FixDetail::Gga {
                fix_quality: field(parts, 6).parse().unwrap_or(0),
                satellites: field(parts, 7).parse().unwrap_or(0),
                altitude,
            },
        )
    }
}

/// Decode with the default time offset
pub fn decode(payload: &str) -> Option<Fix> {
    SentenceDecoder::default().decode(payload)
}

fn field<'a>(parts: &[&'a str], index: usize) -> &'a str {
    parts.get(index).copied().unwrap_or("")
}

/// Drop a trailing `*hh` checksum without validating it
fn strip_checksum(field: &str) -> &str {
    match field.find('*') {
        Some(pos) => &field[..pos],
        None => field,
    }
}

fn non_negative_or_zero(value: &str) -> f64 {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::data::FixKind;

    const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    const RMC: &str = "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";

    #[test]
    fn test_gpgga_parsing() {
        let fix = decode(GGA).unwrap();

        assert_eq!(fix.kind(), FixKind::Gga);
        assert!((fix.latitude.unwrap() - 48.1173).abs() < 1e-4);
        assert!((fix.longitude.unwrap() - 11.5167).abs() < 1e-4);
        assert_eq!(fix.fix_quality(), Some(1));
        assert_eq!(fix.satellites(), Some(8));
        assert_eq!(fix.altitude(), Some(545.4));
        assert_eq!(fix.time, "19:35:19");
    }

    #[test]
    fn test_gprmc_parsing() {
        let fix = decode(RMC).unwrap();

        assert_eq!(fix.kind(), FixKind::Rmc);
        assert_eq!(fix.status(), Some(FixStatus::Valid));
        assert_eq!(fix.speed_knots(), Some(22.4));
        assert_eq!(fix.course(), Some(84.4));
        assert_eq!(fix.date(), Some("230394"));
        assert_eq!(fix.fix_quality(), None);
    }

    #[test]
    fn test_last_sentence_wins() {
        let payload = format!("{}\n{}\n", RMC, GGA);
        let fix = decode(&payload).unwrap();

        assert_eq!(fix.kind(), FixKind::Gga);
        assert_eq!(fix.speed_knots(), None);
        assert_eq!(fix.status(), None);

        let payload = format!("{}\r\n{}", GGA, RMC);
        let fix = decode(&payload).unwrap();
        assert_eq!(fix.kind(), FixKind::Rmc);
        assert_eq!(fix.fix_quality(), None);
    }

    #[test]
    fn test_later_sentence_resets_fields() {
        let payload = format!("{}\n$GPRMC,,V,,,,,,,,,", RMC);
        let fix = decode(&payload).unwrap();

        assert_eq!(fix.status(), Some(FixStatus::Invalid));
        assert_eq!(fix.latitude, None);
        assert_eq!(fix.speed_knots(), Some(0.0));
        assert_eq!(fix.date(), Some("unknown"));
        assert_eq!(fix.time, "unknown");
    }

    #[test]
    fn test_unrecognized_tags() {
        assert_eq!(decode("$INVALID,123,456"), None);
        assert_eq!(decode("$GNGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M"), None);
        assert_eq!(decode("$gpgga,123519,4807.038,N,01131.000,E,1,08"), None);
        assert_eq!(decode(""), None);
    }

    #[test]
    fn test_short_sentence_uses_defaults() {
        let fix = decode("$GPGGA,123519").unwrap();

        assert_eq!(fix.latitude, None);
        assert_eq!(fix.longitude, None);
        assert_eq!(fix.fix_quality(), Some(0));
        assert_eq!(fix.satellites(), Some(0));
        assert_eq!(fix.altitude(), Some(0.0));
    }

    #[test]
    fn test_unparseable_numbers_default() {
        let fix = decode("$GPRMC,123519,A,4807.038,S,01131.000,W,fast,-5,").unwrap();

        assert!(fix.latitude.unwrap() < 0.0);
        assert!(fix.longitude.unwrap() < 0.0);
        assert_eq!(fix.speed_knots(), Some(0.0));
        assert_eq!(fix.course(), Some(0.0));
        assert_eq!(fix.date(), Some("unknown"));
    }

    #[test]
    fn test_custom_offset() {
        let decoder = SentenceDecoder::new(0);
        let fix = decoder.decode(GGA).unwrap();
        assert_eq!(fix.time, "12:35:19");
    }

    #[test]
    fn test_leap_second_time() {
        let fix = decode("$GPGGA,235960,4807.038,N,01131.000,E,1,08,0.9,545.4,M").unwrap();
        assert_eq!(fix.time, "06:59:60");
    }

    #[test]
    fn test_trailing_checksum_on_date() {
        let fix = decode("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394*6A").unwrap();
        assert_eq!(fix.date(), Some("230394"));
    }

    #[test]
    fn test_checksum_in_tag_field_is_not_a_sentence() {
        assert_eq!(decode("$GPGGA*47"), None);
        assert_eq!(decode("$GPRMC*6A"), None);

        // A bogus trailing line must not overwrite the earlier fix
        let payload = format!("{}\n$GPGGA*47", RMC);
        let fix = decode(&payload).unwrap();
        assert_eq!(fix.kind(), FixKind::Rmc);
        assert_eq!(fix.speed_knots(), Some(22.4));
    }
}
