//! Operator console: stand-in for clicking spots on the board.
//!
//! Commands use 1-based spot numbers, like the board and the feed:
//!
//! ```text
//! occupy <spot> <plate>   park a vehicle
//! vacate <plate>          remove a vehicle by plate
//! free <spot>             remove whatever is parked at a spot
//! status                  print counts and feed state
//! json                    print the full state as JSON
//! help | quit
//! ```

use lib_parking::utils::current_timestamp;
use lib_parking::{FeedStatus, ParkingError, SpotRegistry};
use std::io::BufRead;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

pub const HELP: &str = "Commands: occupy <spot> <plate> | vacate <plate> | free <spot> | status | json | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Occupy { index: usize, plate: String },
    Vacate { plate: String },
    Free { index: usize },
    Status,
    Json,
    Help,
    Quit,
}

fn parse_spot(field: &str) -> Result<usize, String> {
    match field.parse::<usize>() {
        Ok(spot) if spot >= 1 => Ok(spot - 1),
        _ => Err(format!("'{}' is not a spot number", field)),
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["occupy", spot, plate] => Ok(Command::Occupy {
            index: parse_spot(spot)?,
            plate: plate.to_string(),
        }),
        ["vacate", plate] => Ok(Command::Vacate {
            plate: plate.to_string(),
        }),
        ["free", spot] => Ok(Command::Free {
            index: parse_spot(spot)?,
        }),
        ["status"] => Ok(Command::Status),
        ["json"] => Ok(Command::Json),
        ["help"] | ["?"] => Ok(Command::Help),
        ["quit"] | ["exit"] => Ok(Command::Quit),
        [] => Err("empty command".to_string()),
        _ => Err(format!("unknown command '{}'", line.trim())),
    }
}

/// Runs one command against the registry and returns the text to show the operator.
pub fn execute(command: &Command, registry: &SpotRegistry, feed: &FeedStatus) -> String {
    let result: Result<String, ParkingError> = match command {
        Command::Occupy { index, plate } => registry
            .occupy(*index, plate, &current_timestamp())
            .map(|()| format!("Spot {} occupied by {}", index + 1, plate.to_uppercase())),
        Command::Vacate { plate } => registry
            .vacate(plate)
            .map(|index| format!("Spot {} freed", index + 1)),
        Command::Free { index } => registry
            .vacate_at(*index)
            .map(|plate| format!("Spot {} freed (was {})", index + 1, plate)),
        Command::Status => Ok(format!(
            "Total: {} | Occupied: {} | Free: {} | Feed: {}{}",
            registry.total_spots(),
            registry.occupied_count(),
            registry.free_count(),
            feed.state(),
            if feed.is_local_mode() { " (local mode)" } else { "" }
        )),
        Command::Json => Ok(serde_json::to_string_pretty(&registry.state())
            .unwrap_or_else(|e| format!("Failed to serialize state: {}", e))),
        Command::Help => Ok(HELP.to_string()),
        Command::Quit => Ok("Bye".to_string()),
    };

    result.unwrap_or_else(|e| format!("Error: {}", e))
}

/// Reads stdin on a dedicated thread so a pending read never holds up runtime shutdown.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read console input: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Applies console commands until `quit`, end of input or shutdown.
pub async fn run(
    registry: Arc<SpotRegistry>,
    feed: FeedStatus,
    mut input: mpsc::Receiver<String>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut shutdown = shutdown_tx.subscribe();
    println!("{}", HELP);

    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            line = input.recv() => {
                let Some(line) = line else {
                    log::info!("Console input closed.");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(Command::Quit) => {
                        log::info!("Quit requested from console.");
                        let _ = shutdown_tx.send(());
                        break;
                    }
                    Ok(command) => println!("{}", execute(&command, &registry, &feed)),
                    Err(e) => println!("{}. {}", e, HELP),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_parking::{FeedConfig, FeedListener};

    fn local_feed(registry: &Arc<SpotRegistry>) -> FeedStatus {
        FeedListener::new(FeedConfig::default(), Arc::clone(registry)).status()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(
            parse_command("occupy 15 abc123"),
            Ok(Command::Occupy {
                index: 14,
                plate: "abc123".to_string()
            })
        );
        assert_eq!(parse_command("  free 1 "), Ok(Command::Free { index: 0 }));
        assert_eq!(parse_command("quit"), Ok(Command::Quit));
        assert!(parse_command("occupy 0 ABC123").is_err());
        assert!(parse_command("occupy x ABC123").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_execute_occupy_free_cycle() {
        let registry = Arc::new(SpotRegistry::new());
        let feed = local_feed(&registry);

        let reply = execute(&parse_command("occupy 3 def456").unwrap(), &registry, &feed);
        assert_eq!(reply, "Spot 3 occupied by DEF456");
        assert_eq!(registry.plate_at(2).unwrap(), "DEF456");

        let reply = execute(&parse_command("occupy 3 XYZ789").unwrap(), &registry, &feed);
        assert!(reply.starts_with("Error: Spot index 2 is already occupied"));

        let reply = execute(&parse_command("free 3").unwrap(), &registry, &feed);
        assert_eq!(reply, "Spot 3 freed (was DEF456)");
        assert_eq!(registry.occupied_count(), 0);
    }

    #[test]
    fn test_execute_reports_errors() {
        let registry = Arc::new(SpotRegistry::new());
        let feed = local_feed(&registry);

        let reply = execute(&parse_command("occupy 1 AB1234").unwrap(), &registry, &feed);
        assert!(reply.starts_with("Error: Invalid plate"));

        let reply = execute(&parse_command("vacate ZZZ999").unwrap(), &registry, &feed);
        assert_eq!(reply, "Error: Plate ZZZ999 is not parked");

        let reply = execute(&parse_command("free 9").unwrap(), &registry, &feed);
        assert_eq!(reply, "Error: Spot index 8 is not occupied");

        let reply = execute(&parse_command("free 41").unwrap(), &registry, &feed);
        assert!(reply.starts_with("Error: Spot index 40 is out of range"));

        let reply = execute(&Command::Status, &registry, &feed);
        assert!(reply.ends_with("Feed: disconnected (local mode)"));
    }
}
