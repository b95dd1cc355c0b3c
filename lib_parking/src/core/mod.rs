//! # Core Occupancy Module
//!
//! The authoritative model of the facility and the rules for changing it.
//!
//! ## Core Components:
//!
//! - **`registry`**: `SpotRegistry`, the mutex-guarded array of spots. Every query
//!   and mutation is atomic with respect to every other caller.
//!
//! - **`reconcile`**: the pure entry/exit/replacement decision applied to each feed
//!   update. The registry runs it under its own lock.
//!
//! - **`plate`**: the `AAA000` plate format, enforced once at the mutation boundary
//!   for both feed-driven and user-driven changes.
//!
//! - **`events`**: the change notifications published after each committed mutation.
//!
//! - **`error`**: `ParkingError`, the single error taxonomy of the crate.

/// Error taxonomy shared by every component.
pub mod error;
/// Change notifications emitted by the registry.
pub mod events;
/// Validated license plates.
pub mod plate;
/// Entry/exit/replacement decision for feed updates.
pub mod reconcile;
/// The thread-safe spot registry.
pub mod registry;

// --- Public API Re-exports ---
pub use error::{ParkingError, ParkingResult};
pub use events::OccupancyEvent;
pub use plate::Plate;
pub use reconcile::Action;
pub use registry::{OccupiedSpot, ParkingState, SpotRegistry, TOTAL_SPOTS};
