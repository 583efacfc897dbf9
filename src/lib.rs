// src/lib.rs
//! NMEA Relay Library
//!
//! Decodes NMEA 0183 position sentences posted over HTTP into fixes and fans
//! them out to WebSocket subscribers, optionally persisting each one.

pub mod config;
pub mod error;
pub mod gps;
pub mod relay;
pub mod server;
pub mod store;

// Re-export main types for convenience
pub use error::{RelayError, Result};
pub use gps::{Fix, SentenceDecoder};
pub use relay::{Relay, Subscription};
pub use store::FixStore;
