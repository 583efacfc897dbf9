// src/error.rs
//! Error types for the NMEA relay

use std::fmt;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug)]
pub enum RelayError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Database(sqlx::Error),
    Config(String),
    Other(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Io(e) => write!(f, "IO error: {}", e),
            RelayError::Json(e) => write!(f, "JSON error: {}", e),
            RelayError::Database(e) => write!(f, "Database error: {}", e),
            RelayError::Config(msg) => write!(f, "Configuration error: {}", msg),
            RelayError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Io(e) => Some(e),
            RelayError::Json(e) => Some(e),
            RelayError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RelayError {
    fn from(error: std::io::Error) -> Self {
        RelayError::Io(error)
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        RelayError::Json(error)
    }
}

impl From<sqlx::Error> for RelayError {
    fn from(error: sqlx::Error) -> Self {
        RelayError::Database(error)
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(error: anyhow::Error) -> Self {
        RelayError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        let err = RelayError::Config("bad port".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad port");

        let err: RelayError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "Error: boom");
    }

    #[test]
    fn test_json_source_is_kept() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = RelayError::from(json_err);
        assert!(std::error::Error::source(&err).is_some());
    }
}
