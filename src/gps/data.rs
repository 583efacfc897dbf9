// src/gps/data.rs
//! Decoded position fix structures

use serde::{Deserialize, Serialize};

/// Sentence type a fix was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixKind {
    #[serde(rename = "GPRMC")]
    Rmc,
    #[serde(rename = "GPGGA")]
    Gga,
}

impl FixKind {
    pub fn tag(self) -> &'static str {
        match self {
            FixKind::Rmc => "GPRMC",
            FixKind::Gga => "GPGGA",
        }
    }
}

/// RMC receiver status flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixStatus {
    Valid,
    Invalid,
}

impl FixStatus {
    /// `A` (active) is the only flag reported as valid
    pub fn from_flag(flag: &str) -> Self {
        if flag == "A" {
            FixStatus::Valid
        } else {
            FixStatus::Invalid
        }
    }
}

/// Fields only one of the two sentence types carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixDetail {
    Rmc {
        status: FixStatus,
        speed_knots: f64,
        course: f64,
        date: String,
    },
    Gga {
        fix_quality: u32,
        satellites: u32,
        altitude: f64,
    },
}

/// A single decoded GPS observation.
///
/// Serializes with a stable field order: `type`, `time`, `latitude`,
/// `longitude`, then the sentence-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fix {
    #[serde(rename = "type")]
    kind: FixKind,
    pub time: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub detail: FixDetail,
}

impl Fix {
    pub fn new(time: String, latitude: Option<f64>, longitude: Option<f64>, detail: FixDetail) -> Self {
        let kind = match detail {
            FixDetail::Rmc { .. } => FixKind::Rmc,
            FixDetail::Gga { .. } => FixKind::Gga,
        };

        Self {
            kind,
            time,
            latitude,
            longitude,
            detail,
        }
    }

    pub fn kind(&self) -> FixKind {
        self.kind
    }

    /// Check if both coordinates were decoded
    pub fn has_position(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    pub fn status(&self) -> Option<FixStatus> {
        match self.detail {
            FixDetail::Rmc { status, .. } => Some(status),
            FixDetail::Gga { .. } => None,
        }
    }

    pub fn speed_knots(&self) -> Option<f64> {
        match self.detail {
            FixDetail::Rmc { speed_knots, .. } => Some(speed_knots),
            FixDetail::Gga { .. } => None,
        }
    }

    pub fn course(&self) -> Option<f64> {
        match self.detail {
            FixDetail::Rmc { course, .. } => Some(course),
            FixDetail::Gga { .. } => None,
        }
    }

    pub fn date(&self) -> Option<&str> {
        match &self.detail {
            FixDetail::Rmc { date, .. } => Some(date),
            FixDetail::Gga { .. } => None,
        }
    }

    pub fn fix_quality(&self) -> Option<u32> {
        match self.detail {
            FixDetail::Gga { fix_quality, .. } => Some(fix_quality),
            FixDetail::Rmc { .. } => None,
        }
    }

    pub fn satellites(&self) -> Option<u32> {
        match self.detail {
            FixDetail::Gga { satellites, .. } => Some(satellites),
            FixDetail::Rmc { .. } => None,
        }
    }

    pub fn altitude(&self) -> Option<f64> {
        match self.detail {
            FixDetail::Gga { altitude, .. } => Some(altitude),
            FixDetail::Rmc { .. } => None,
        }
    }
}

/// Raw request body as resolved at the HTTP boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Unparseable,
}

impl Payload {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Payload::Text(text.to_string()),
            Err(_) => Payload::Unparseable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gga_fix() -> Fix {
        Fix::new(
            "19:35:19".to_string(),
            Some(48.1173),
            Some(11.516667),
            FixDetail::Gga {
                fix_quality: 1,
                satellites: 8,
                altitude: 545.4,
            },
        )
    }

    #[test]
    fn test_kind_follows_detail() {
        let fix = gga_fix();
        assert_eq!(fix.kind(), FixKind::Gga);
        assert_eq!(fix.speed_knots(), None);
        assert_eq!(fix.satellites(), Some(8));
    }

    #[test]
    fn test_gga_json_field_order() {
        let json = serde_json::to_string(&gga_fix()).unwrap();
        assert_eq!(
            json,
            r#"{"type":"GPGGA","time":"19:35:19","latitude":48.1173,"longitude":11.516667,"fix_quality":1,"satellites":8,"altitude":545.4}"#
        );
    }

    #[test]
    fn test_rmc_json_keeps_null_coordinates() {
        let fix = Fix::new(
            "unknown".to_string(),
            None,
            None,
            FixDetail::Rmc {
                status: FixStatus::Invalid,
                speed_knots: 0.0,
                course: 0.0,
                date: "unknown".to_string(),
            },
        );

        let json = serde_json::to_string(&fix).unwrap();
        assert_eq!(
            json,
            r#"{"type":"GPRMC","time":"unknown","latitude":null,"longitude":null,"status":"Invalid","speed_knots":0.0,"course":0.0,"date":"unknown"}"#
        );
        assert!(!fix.has_position());
    }

    #[test]
    fn test_payload_from_bytes() {
        assert_eq!(Payload::from_bytes(b"$GPGGA"), Payload::Text("$GPGGA".to_string()));
        assert_eq!(Payload::from_bytes(&[0xff, 0xfe, 0x00]), Payload::Unparseable);
    }
}
