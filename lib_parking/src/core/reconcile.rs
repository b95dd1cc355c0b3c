//! # Reconciliation Policy
//!
//! Maps one incoming [`UpdateIntent`] onto the current occupant of its target spot.
//! Each spot is in one of three states from the feed's point of view, and each
//! state has exactly one action:
//!
//! | occupant            | action                                   |
//! |---------------------|------------------------------------------|
//! | none                | `Entry`: occupy the spot                 |
//! | same plate          | `Exit`: vacate the plate                 |
//! | different plate     | `Replace`: evict and occupy in one step  |
//!
//! The feed has no explicit exit message, so a re-announcement of the plate already
//! parked at a spot is read as a departure. A feed that only meant to re-confirm an
//! unchanged occupancy will vacate the spot instead. That ambiguity belongs to the
//! wire protocol and is kept as is.
//!
//! [`plan`] is pure. The registry runs it and the chosen mutation under one lock
//! acquisition (see [`SpotRegistry::reconcile`](crate::core::registry::SpotRegistry::reconcile)).

use crate::core::plate::{self, Plate};
use crate::protocol::decoder::UpdateIntent;

/// The mutation chosen for one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Target spot is free.
    Entry,
    /// Target spot already holds the intent's plate.
    Exit,
    /// Target spot holds another plate, which gets evicted.
    Replace { evicted: Plate },
}

/// Decides what to do with `intent` given the plate currently parked at its target.
///
/// The intent's plate is compared in normalized form. A plate that would fail
/// validation can never equal a live plate, so it falls through to `Entry` or
/// `Replace` and is rejected there with `InvalidPlate`.
pub fn plan(occupant: Option<&Plate>, intent: &UpdateIntent) -> Action {
    match occupant {
        None => Action::Entry,
        Some(current) if *current == plate::normalize(&intent.plate).as_str() => Action::Exit,
        Some(current) => Action::Replace {
            evicted: current.clone(),
        },
    }
}
