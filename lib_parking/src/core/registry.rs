//! # Spot Registry
//!
//! The single source of truth for the facility. Holds exactly [`TOTAL_SPOTS`] spot
//! records behind one `Mutex`, so every public method observes either the state
//! before or the state after any other call, never a partial update.
//!
//! Two independent flows share an `Arc<SpotRegistry>`: the feed listener applying
//! network updates and the display polling snapshots or applying user actions.
//! Neither coordinates with the other beyond this lock.
//!
//! Committed mutations are also published on a broadcast channel
//! ([`SpotRegistry::subscribe`]) so consumers can keep an event log without polling.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::broadcast;

use crate::core::error::{ParkingError, ParkingResult};
use crate::core::events::OccupancyEvent;
use crate::core::plate::{self, Plate};
use crate::core::reconcile::{self, Action};
use crate::protocol::decoder::UpdateIntent;

/// Number of spots in the facility.
pub const TOTAL_SPOTS: usize = 40;

/// Buffered events per subscriber before the slowest one starts skipping.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Occupant {
    plate: Plate,
    entered_at: String,
}

/// One physical parking space.
#[derive(Debug, Clone, Default)]
struct Spot {
    occupant: Option<Occupant>,
}

/// # Occupied Spot
///
/// One row of a [`SpotRegistry::snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccupiedSpot {
    pub index: usize,
    pub plate: Plate,
    pub entered_at: String,
}

/// # Parking State
///
/// Summary of the whole facility taken under a single lock acquisition, so the
/// counts always agree with `vehicles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParkingState {
    pub total_spots: usize,
    pub occupied_count: usize,
    pub free_count: usize,
    pub vehicles: Vec<OccupiedSpot>,
}

/// The spot array itself. Every method here assumes the caller holds the lock.
struct Spots(Vec<Spot>);

impl Spots {
    fn new() -> Self {
        Self(vec![Spot::default(); TOTAL_SPOTS])
    }

    fn spot(&self, index: usize) -> ParkingResult<&Spot> {
        self.0.get(index).ok_or(ParkingError::OutOfRange {
            index: index as i64,
            total: TOTAL_SPOTS,
        })
    }

    fn occupant(&self, index: usize) -> ParkingResult<Option<&Occupant>> {
        Ok(self.spot(index)?.occupant.as_ref())
    }

    fn find(&self, plate: &str) -> Option<usize> {
        self.0.iter().position(|spot| {
            spot.occupant
                .as_ref()
                .is_some_and(|occupant| occupant.plate == plate)
        })
    }

    fn occupied_count(&self) -> usize {
        self.0.iter().filter(|spot| spot.occupant.is_some()).count()
    }

    fn occupied(&self) -> Vec<OccupiedSpot> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(index, spot)| {
                spot.occupant.as_ref().map(|occupant| OccupiedSpot {
                    index,
                    plate: occupant.plate.clone(),
                    entered_at: occupant.entered_at.clone(),
                })
            })
            .collect()
    }

    /// Rejects `plate` if it is live anywhere other than `except`.
    fn ensure_unique(&self, plate: &Plate, except: Option<usize>) -> ParkingResult<()> {
        match self.find(plate.as_str()) {
            Some(index) if Some(index) != except => Err(ParkingError::DuplicatePlate {
                plate: plate.to_string(),
                index,
            }),
            _ => Ok(()),
        }
    }

    fn occupy(&mut self, index: usize, plate: Plate, entered_at: &str) -> ParkingResult<()> {
        if let Some(current) = self.occupant(index)? {
            return Err(ParkingError::AlreadyOccupied {
                index,
                plate: current.plate.to_string(),
            });
        }
        self.ensure_unique(&plate, None)?;
        self.0[index].occupant = Some(Occupant {
            plate,
            entered_at: entered_at.to_string(),
        });
        Ok(())
    }

    fn vacate(&mut self, plate: &str) -> ParkingResult<(usize, Plate)> {
        let normalized = plate::normalize(plate);
        let index = self
            .find(&normalized)
            .ok_or_else(|| ParkingError::PlateNotFound(normalized.clone()))?;
        // `find` only returns occupied indexes.
        let occupant = self.0[index]
            .occupant
            .take()
            .ok_or(ParkingError::NotOccupied { index })?;
        Ok((index, occupant.plate))
    }

    fn vacate_at(&mut self, index: usize) -> ParkingResult<Plate> {
        self.occupant(index)?;
        self.0[index]
            .occupant
            .take()
            .map(|occupant| occupant.plate)
            .ok_or(ParkingError::NotOccupied { index })
    }

    /// Swaps the occupant of `index` for `plate` without the spot ever being empty.
    fn replace(&mut self, index: usize, plate: Plate, entered_at: &str) -> ParkingResult<Plate> {
        let evicted = match self.occupant(index)? {
            None => return Err(ParkingError::NotOccupied { index }),
            Some(current) if current.plate == plate => {
                return Err(ParkingError::AlreadyOccupied {
                    index,
                    plate: current.plate.to_string(),
                });
            }
            Some(current) => current.plate.clone(),
        };
        self.ensure_unique(&plate, Some(index))?;
        self.0[index].occupant = Some(Occupant {
            plate,
            entered_at: entered_at.to_string(),
        });
        Ok(evicted)
    }
}

/// # Spot Registry
///
/// Thread-safe owner of the facility state. Share it with `Arc`.
pub struct SpotRegistry {
    spots: Mutex<Spots>,
    events: broadcast::Sender<OccupancyEvent>,
}

impl Default for SpotRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SpotRegistry {
    /// Creates a registry with every spot empty.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            spots: Mutex::new(Spots::new()),
            events,
        }
    }

    // Mutations validate fully before writing, so a panic elsewhere cannot leave a
    // half-applied spot behind and the poison flag carries no information.
    fn lock(&self) -> MutexGuard<'_, Spots> {
        self.spots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_index(index: usize) -> ParkingResult<()> {
        if index < TOTAL_SPOTS {
            Ok(())
        } else {
            Err(ParkingError::OutOfRange {
                index: index as i64,
                total: TOTAL_SPOTS,
            })
        }
    }

    /// Publishes while the lock is still held, keeping event order equal to commit order.
    fn publish(&self, event: &OccupancyEvent) {
        // No subscribers is the normal local-mode case.
        let _ = self.events.send(event.clone());
    }

    pub fn total_spots(&self) -> usize {
        TOTAL_SPOTS
    }

    pub fn is_occupied(&self, index: usize) -> ParkingResult<bool> {
        Ok(self.lock().occupant(index)?.is_some())
    }

    /// Plate parked at `index`.
    pub fn plate_at(&self, index: usize) -> ParkingResult<Plate> {
        self.lock()
            .occupant(index)?
            .map(|occupant| occupant.plate.clone())
            .ok_or(ParkingError::NotOccupied { index })
    }

    /// Timestamp recorded when the vehicle at `index` entered.
    pub fn entered_at(&self, index: usize) -> ParkingResult<String> {
        self.lock()
            .occupant(index)?
            .map(|occupant| occupant.entered_at.clone())
            .ok_or(ParkingError::NotOccupied { index })
    }

    /// Index of the spot holding `plate`, if any. The plate is normalized first.
    pub fn find_plate(&self, plate: &str) -> Option<usize> {
        self.lock().find(&plate::normalize(plate))
    }

    /// # Occupy
    ///
    /// Parks `plate` at `index`. Fails with `OutOfRange`, `InvalidPlate`,
    /// `AlreadyOccupied`, or `DuplicatePlate` when the plate is already parked
    /// elsewhere.
    pub fn occupy(&self, index: usize, plate: &str, entered_at: &str) -> ParkingResult<()> {
        Self::check_index(index)?;
        let plate = Plate::parse(plate)?;

        let mut spots = self.lock();
        spots.occupy(index, plate.clone(), entered_at)?;
        self.publish(&OccupancyEvent::Entry {
            index,
            plate,
            entered_at: entered_at.to_string(),
        });
        Ok(())
    }

    /// # Vacate
    ///
    /// Removes the vehicle with `plate` from wherever it is parked and returns the
    /// freed index. Lookup is by plate because exit events only know the plate.
    pub fn vacate(&self, plate: &str) -> ParkingResult<usize> {
        let mut spots = self.lock();
        let (index, plate) = spots.vacate(plate)?;
        self.publish(&OccupancyEvent::Exit { index, plate });
        Ok(index)
    }

    /// Frees spot `index` whatever is parked there and returns the removed plate.
    pub fn vacate_at(&self, index: usize) -> ParkingResult<Plate> {
        let mut spots = self.lock();
        let plate = spots.vacate_at(index)?;
        self.publish(&OccupancyEvent::Exit {
            index,
            plate: plate.clone(),
        });
        Ok(plate)
    }

    /// # Replace
    ///
    /// Evicts the current occupant of `index` and parks `plate` there as a single
    /// step. A concurrent reader sees the old occupant or the new one, never an empty
    /// spot. Returns the evicted plate.
    pub fn replace(&self, index: usize, plate: &str, entered_at: &str) -> ParkingResult<Plate> {
        Self::check_index(index)?;
        let plate = Plate::parse(plate)?;

        let mut spots = self.lock();
        let evicted = spots.replace(index, plate.clone(), entered_at)?;
        self.publish(&OccupancyEvent::Replacement {
            index,
            evicted: evicted.clone(),
            plate,
            entered_at: entered_at.to_string(),
        });
        Ok(evicted)
    }

    /// # Reconcile
    ///
    /// Applies one feed update. The occupant is read, the policy decides, and the
    /// mutation is applied without releasing the lock in between, so the decision
    /// can never be based on state another flow has already changed.
    pub fn reconcile(&self, intent: &UpdateIntent) -> ParkingResult<OccupancyEvent> {
        let index = intent.target_index;
        Self::check_index(index)?;

        let mut spots = self.lock();
        let action = reconcile::plan(
            spots.occupant(index)?.map(|occupant| &occupant.plate),
            intent,
        );

        let event = match action {
            Action::Entry => {
                let plate = Plate::parse(&intent.plate)?;
                spots.occupy(index, plate.clone(), &intent.timestamp)?;
                OccupancyEvent::Entry {
                    index,
                    plate,
                    entered_at: intent.timestamp.clone(),
                }
            }
            Action::Exit => {
                let (index, plate) = spots.vacate(&intent.plate)?;
                OccupancyEvent::Exit { index, plate }
            }
            Action::Replace { evicted } => {
                let plate = Plate::parse(&intent.plate)?;
                let replaced = spots.replace(index, plate.clone(), &intent.timestamp)?;
                debug_assert_eq!(replaced, evicted);
                OccupancyEvent::Replacement {
                    index,
                    evicted,
                    plate,
                    entered_at: intent.timestamp.clone(),
                }
            }
        };

        self.publish(&event);
        Ok(event)
    }

    pub fn occupied_count(&self) -> usize {
        self.lock().occupied_count()
    }

    pub fn free_count(&self) -> usize {
        TOTAL_SPOTS - self.lock().occupied_count()
    }

    /// Occupied spots ordered by index.
    pub fn snapshot(&self) -> Vec<OccupiedSpot> {
        self.lock().occupied()
    }

    /// Counts and vehicles from one consistent view.
    pub fn state(&self) -> ParkingState {
        let vehicles = self.lock().occupied();
        let occupied_count = vehicles.len();
        ParkingState {
            total_spots: TOTAL_SPOTS,
            occupied_count,
            free_count: TOTAL_SPOTS - occupied_count,
            vehicles,
        }
    }

    /// Receives every committed mutation from now on. Lagging receivers skip ahead.
    pub fn subscribe(&self) -> broadcast::Receiver<OccupancyEvent> {
        self.events.subscribe()
    }
}
