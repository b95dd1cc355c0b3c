use std::fmt;

use serde::Serialize;

use crate::core::plate::Plate;

/// # Occupancy Event
///
/// One committed change to the registry. Events are broadcast to subscribers in the
/// order the mutations were applied and double as the outcome of
/// [`SpotRegistry::reconcile`](crate::core::registry::SpotRegistry::reconcile).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OccupancyEvent {
    /// A vehicle took a free spot.
    Entry {
        index: usize,
        plate: Plate,
        entered_at: String,
    },
    /// A vehicle left its spot.
    Exit { index: usize, plate: Plate },
    /// A different vehicle took an occupied spot. The evicted plate gets no exit event.
    Replacement {
        index: usize,
        evicted: Plate,
        plate: Plate,
        entered_at: String,
    },
}

impl OccupancyEvent {
    /// Zero-based index of the spot the event touched.
    pub fn index(&self) -> usize {
        match self {
            OccupancyEvent::Entry { index, .. }
            | OccupancyEvent::Exit { index, .. }
            | OccupancyEvent::Replacement { index, .. } => *index,
        }
    }
}

impl fmt::Display for OccupancyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Spots are shown 1-based, the way the feed and the board number them.
        match self {
            OccupancyEvent::Entry { index, plate, entered_at } => {
                write!(f, "ENTRY spot {} <- {} at {}", index + 1, plate, entered_at)
            }
            OccupancyEvent::Exit { index, plate } => {
                write!(f, "EXIT spot {} -> {}", index + 1, plate)
            }
            OccupancyEvent::Replacement { index, evicted, plate, entered_at } => write!(
                f,
                "REPLACE spot {}: {} -> {} at {}",
                index + 1,
                evicted,
                plate,
                entered_at
            ),
        }
    }
}
