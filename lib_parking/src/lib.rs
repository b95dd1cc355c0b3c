//! # Parking Occupancy Engine
//!
//! Tracks which of the 40 spots of a parking facility are occupied, and by which
//! plate, while a live network feed and a display consumer read and change that
//! state concurrently.
//!
//! ## Modules
//! * `core` – `SpotRegistry`, plate validation, reconciliation policy, errors.
//! * `protocol` – decoder for the `<spot>:<plate>[:<timestamp>]` wire format.
//! * `ingestors` – `FeedListener`, the background client that applies the feed.
//! * `utils` – timestamp helpers.
//!
//! ## Data flow
//! ```text
//! socket line -> protocol::decode -> SpotRegistry::reconcile -> OccupancyEvent
//!                                           ^
//! display: snapshot / occupy / vacate ------+
//! ```

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod core;
pub mod ingestors;
pub mod protocol;
pub mod utils;

// Re-export the consumer-facing surface
pub use crate::core::{
    OccupancyEvent, OccupiedSpot, ParkingError, ParkingResult, ParkingState, Plate, SpotRegistry,
    TOTAL_SPOTS,
};
pub use crate::ingestors::{FeedConfig, FeedListener, FeedReport, FeedState, FeedStatus};
pub use crate::protocol::UpdateIntent;
