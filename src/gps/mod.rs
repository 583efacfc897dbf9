// src/gps/mod.rs
//! GPS sentence decoding and fix validation

pub mod codec;
pub mod data;
pub mod gate;
pub mod nmea;

pub use data::{Fix, FixDetail, FixKind, FixStatus, Payload};
pub use nmea::SentenceDecoder;
