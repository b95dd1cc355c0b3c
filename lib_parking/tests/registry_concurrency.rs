use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use lib_parking::{ParkingError, SpotRegistry, UpdateIntent, TOTAL_SPOTS};

const TS: &str = "2024-11-25 14:30:45";

fn plate_for(index: usize) -> String {
    format!("CAR{:03}", index)
}

fn assert_invariants(registry: &SpotRegistry) {
    let snapshot = registry.snapshot();
    assert_eq!(registry.occupied_count() + registry.free_count(), TOTAL_SPOTS);

    let plates: HashSet<_> = snapshot.iter().map(|spot| spot.plate.clone()).collect();
    assert_eq!(plates.len(), snapshot.len(), "duplicate live plate");

    let indexes: Vec<_> = snapshot.iter().map(|spot| spot.index).collect();
    let mut sorted = indexes.clone();
    sorted.sort_unstable();
    assert_eq!(indexes, sorted, "snapshot not ordered by index");
}

#[test]
fn test_concurrent_occupy_on_distinct_spots() {
    let registry = Arc::new(SpotRegistry::new());

    let handles: Vec<_> = (0..TOTAL_SPOTS)
        .map(|index| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.occupy(index, &plate_for(index), TS))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), Ok(()));
    }

    assert_eq!(registry.occupied_count(), TOTAL_SPOTS);
    assert_eq!(registry.free_count(), 0);
    for index in 0..TOTAL_SPOTS {
        assert_eq!(registry.plate_at(index).unwrap(), plate_for(index).as_str());
    }
    assert_invariants(&registry);
}

#[test]
fn test_concurrent_occupy_same_spot_has_one_winner() {
    let registry = Arc::new(SpotRegistry::new());

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.occupy(9, &plate_for(n), TS))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, ParkingError::AlreadyOccupied { index: 9, .. })));
    assert_eq!(registry.occupied_count(), 1);
}

#[test]
fn test_concurrent_same_plate_parks_once() {
    let registry = Arc::new(SpotRegistry::new());

    let handles: Vec<_> = (0..TOTAL_SPOTS)
        .map(|index| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.occupy(index, "ABC123", TS))
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(Result::is_ok)
        .count();
    assert_eq!(winners, 1);
    assert_eq!(registry.occupied_count(), 1);
    assert_invariants(&registry);
}

#[test]
fn test_replacement_never_observed_empty() {
    let registry = Arc::new(SpotRegistry::new());
    registry.occupy(0, "AAA000", TS).unwrap();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for round in 1..=500 {
                let plate = format!("AAA{:03}", round % 1000);
                registry
                    .reconcile(&UpdateIntent::new(0, &plate, TS))
                    .unwrap();
            }
        })
    };

    let reader = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for _ in 0..2_000 {
                let snapshot = registry.snapshot();
                assert_eq!(snapshot.len(), 1, "spot 0 seen empty mid-replacement");
                assert_eq!(snapshot[0].index, 0);
            }
        })
    };

    writer.join().unwrap();
    reader.join().unwrap();
    assert_eq!(registry.plate_at(0).unwrap(), "AAA500");
}

#[test]
fn test_mixed_feed_and_user_flows_keep_invariants() {
    let registry = Arc::new(SpotRegistry::new());

    // Feed flow: toggles plates on the even spots.
    let feed = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for round in 0..20 {
                for index in (0..TOTAL_SPOTS).step_by(2) {
                    let plate = format!("FED{:03}", (index + round) % 7);
                    let _ = registry.reconcile(&UpdateIntent::new(index, &plate, TS));
                }
            }
        })
    };

    // User flow: occupies and vacates the odd spots, racing the feed on plates.
    let user = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for round in 0..20 {
                for index in (1..TOTAL_SPOTS).step_by(2) {
                    let plate = format!("FED{:03}", (index + round) % 7);
                    if registry.occupy(index, &plate, TS).is_ok() {
                        let _ = registry.vacate(&plate);
                    }
                }
                // Separate count calls may straddle a feed mutation; `state` may not.
                let state = registry.state();
                assert_eq!(state.vehicles.len(), state.occupied_count);
                assert_eq!(state.occupied_count + state.free_count, TOTAL_SPOTS);
            }
        })
    };

    feed.join().unwrap();
    user.join().unwrap();
    assert_invariants(&registry);
}
