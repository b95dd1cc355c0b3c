//! Terminal status board: the passive display consumer.
//!
//! Polls the registry on its own interval and prints an 8x5 grid of spots, the way
//! the facility is laid out on screen. Registry events are echoed as they arrive
//! so the board doubles as an event log. Nothing here waits on network I/O.

use colored::Colorize;
use lib_parking::{FeedState, FeedStatus, OccupancyEvent, ParkingState, SpotRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{interval, MissedTickBehavior};

pub const BOARD_COLUMNS: usize = 5;

/// Renders the summary line and the spot grid.
pub fn render_board(state: &ParkingState, feed: FeedState) -> String {
    let mut board = format!(
        "Total: {} | Occupied: {} | Free: {} | Feed: {}\n",
        state.total_spots, state.occupied_count, state.free_count, feed
    );

    let mut vehicles = state.vehicles.iter().peekable();
    for index in 0..state.total_spots {
        let cell = match vehicles.next_if(|vehicle| vehicle.index == index) {
            Some(vehicle) => format!("[{:>2} {}]", index + 1, vehicle.plate).red(),
            None => format!("[{:>2} ------]", index + 1).green(),
        };
        board.push_str(&cell.to_string());
        board.push(if (index + 1) % BOARD_COLUMNS == 0 { '\n' } else { ' ' });
    }
    board
}

fn render_event(event: &OccupancyEvent) -> String {
    let line = event.to_string();
    match event {
        OccupancyEvent::Entry { .. } => line.bright_red().to_string(),
        OccupancyEvent::Exit { .. } => line.bright_green().to_string(),
        OccupancyEvent::Replacement { .. } => line.bright_yellow().to_string(),
    }
}

/// Refreshes the board every `refresh` until shutdown.
pub async fn run(
    registry: Arc<SpotRegistry>,
    feed: FeedStatus,
    refresh: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut events = registry.subscribe();
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Status board received shutdown signal.");
                break;
            }
            _ = ticker.tick() => {
                println!("{}", render_board(&registry.state(), feed.state()));
            }
            event = events.recv() => match event {
                Ok(event) => println!("{}", render_event(&event)),
                Err(RecvError::Lagged(missed)) => {
                    log::warn!("Status board skipped {} occupancy events", missed);
                }
                // The registry outlives this task, so the sender cannot be gone.
                Err(RecvError::Closed) => break,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_board_grid() {
        colored::control::set_override(false);

        let registry = SpotRegistry::new();
        registry.occupy(0, "ABC123", "t").unwrap();
        registry.occupy(6, "XYZ789", "t").unwrap();

        let board = render_board(&registry.state(), FeedState::Disconnected);
        let lines: Vec<&str> = board.lines().collect();

        assert_eq!(lines[0], "Total: 40 | Occupied: 2 | Free: 38 | Feed: disconnected");
        assert_eq!(lines.len(), 1 + 40 / BOARD_COLUMNS);
        assert!(lines[1].starts_with("[ 1 ABC123] [ 2 ------]"));
        assert!(lines[2].starts_with("[ 6 ------] [ 7 XYZ789]"));
        assert!(lines[8].ends_with("[40 ------]"));
    }
}
