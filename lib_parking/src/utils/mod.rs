//! # Utilities Module
//!
//! Small helpers shared by the registry, the decoder and the host binaries that do
//! not belong to any one component.

/// Local timestamp formatting.
pub mod time;

pub use time::{current_timestamp, TIMESTAMP_FORMAT};
