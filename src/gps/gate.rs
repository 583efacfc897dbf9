// src/gps/gate.rs
//! Decides whether a decoded fix is usable downstream

use super::data::Fix;

/// Accept a fix with a positive GGA quality code or with both coordinates.
///
/// Receivers can report a quality code before coordinates lock, so either
/// condition alone is enough.
pub fn is_acceptable(fix: &Fix) -> bool {
    fix.fix_quality().is_some_and(|quality| quality > 0) || fix.has_position()
}

/// Pass through the decoder output only if it holds an acceptable fix
pub fn accept(decoded: Option<Fix>) -> Option<Fix> {
    decoded.filter(is_acceptable)
}
