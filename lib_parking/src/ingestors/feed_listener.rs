//! # Parking Feed Listener
//!
//! Background ingestor for the real-time occupancy feed. It makes exactly one
//! connection attempt. While connected it decodes each line and reconciles it into
//! the shared [`SpotRegistry`]. When the connection fails or closes it stops for
//! good and the registry carries on in local mode.
//!
//! ```text
//! Disconnected -> Connecting -> Connected -> Disconnected
//!                     |                          ^
//!                     +------ connect failed ----+
//! ```
//!
//! There is no reconnect, no receive timeout and no cancellation other than closing
//! the socket or ending the process. Callers observe progress through a
//! [`FeedStatus`] handle instead of waiting on the task.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::core::error::ParkingError;
use crate::core::registry::SpotRegistry;
use crate::protocol::decoder;

/// Connection target for the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub host: String,
    pub port: u16,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8080,
        }
    }
}

impl FeedConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Lifecycle of the feed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedState {
    /// Not connected: either not started yet or permanently stopped.
    Disconnected,
    /// Connection attempt in flight.
    Connecting,
    /// Receiving updates.
    Connected,
}

impl fmt::Display for FeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedState::Disconnected => "disconnected",
            FeedState::Connecting => "connecting",
            FeedState::Connected => "connected",
        };
        f.write_str(label)
    }
}

/// Read-only view of a listener's state, cheap to clone and query from any flow.
#[derive(Debug, Clone)]
pub struct FeedStatus {
    rx: watch::Receiver<FeedState>,
}

impl FeedStatus {
    pub fn state(&self) -> FeedState {
        *self.rx.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == FeedState::Connected
    }

    /// True whenever updates can only come from direct registry calls.
    pub fn is_local_mode(&self) -> bool {
        !self.is_connected()
    }

    /// Waits until the listener reaches `target`. Returns `false` if the listener
    /// was dropped first.
    pub async fn wait_for(&mut self, target: FeedState) -> bool {
        self.rx.wait_for(|state| *state == target).await.is_ok()
    }
}

/// Outcome of one listener run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedReport {
    /// Lines that produced a registry mutation.
    pub applied: usize,
    /// Lines dropped on a decode or registry error.
    pub skipped: usize,
    /// `ConnectionFailed` or `ConnectionClosed`.
    pub ended_by: ParkingError,
}

/// # Feed Listener
///
/// Consumed by [`FeedListener::start`] or [`FeedListener::run`], so a listener can
/// only ever make one connection attempt.
pub struct FeedListener {
    config: FeedConfig,
    registry: Arc<SpotRegistry>,
    state_tx: watch::Sender<FeedState>,
}

impl FeedListener {
    pub fn new(config: FeedConfig, registry: Arc<SpotRegistry>) -> Self {
        let (state_tx, _) = watch::channel(FeedState::Disconnected);
        Self {
            config,
            registry,
            state_tx,
        }
    }

    /// Status handle that stays valid after the listener has been started.
    pub fn status(&self) -> FeedStatus {
        FeedStatus {
            rx: self.state_tx.subscribe(),
        }
    }

    /// Spawns [`run`](Self::run) on the current tokio runtime and returns at once.
    pub fn start(self) -> JoinHandle<FeedReport> {
        tokio::spawn(self.run())
    }

    /// Connects once and processes the feed until it ends.
    ///
    /// Never fails: a refused connection is an expected outcome and is reported in
    /// [`FeedReport::ended_by`].
    pub async fn run(self) -> FeedReport {
        let addr = self.config.addr();
        self.transition(FeedState::Connecting);
        log::info!("Connecting to parking feed: {}", addr);

        match TcpStream::connect(&addr).await {
            Ok(stream) => {
                log::info!("Connected to parking feed at {}", addr);
                self.run_on(stream).await
            }
            Err(e) => {
                log::warn!(
                    "Failed to connect to parking feed at {}: {}. Running in local mode.",
                    addr,
                    e
                );
                self.transition(FeedState::Disconnected);
                FeedReport {
                    applied: 0,
                    skipped: 0,
                    ended_by: ParkingError::ConnectionFailed {
                        addr,
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    /// Runs the receive loop over an already established byte stream.
    pub async fn run_on<R>(self, reader: R) -> FeedReport
    where
        R: AsyncRead + Unpin,
    {
        self.transition(FeedState::Connected);

        let mut lines = BufReader::new(reader).lines();
        let mut applied = 0;
        let mut skipped = 0;

        let ended_by = loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    if self.handle_line(&line) {
                        applied += 1;
                    } else {
                        skipped += 1;
                    }
                }
                Ok(None) => {
                    log::warn!("Parking feed closed by remote host. Continuing in local mode.");
                    break ParkingError::ConnectionClosed("end of stream".to_string());
                }
                Err(e) => {
                    log::error!("Parking feed read error: {}. Continuing in local mode.", e);
                    break ParkingError::ConnectionClosed(e.to_string());
                }
            }
        };

        self.transition(FeedState::Disconnected);
        log::info!(
            "Parking feed stopped: {} applied, {} skipped",
            applied,
            skipped
        );

        FeedReport {
            applied,
            skipped,
            ended_by,
        }
    }

    /// Decodes and reconciles one line. Returns whether the registry changed.
    fn handle_line(&self, line: &str) -> bool {
        log::debug!("Feed message: {}", line);

        let intent = match decoder::decode(line) {
            Ok(intent) => intent,
            Err(e) => {
                log::warn!("Discarding feed message: {}", e);
                return false;
            }
        };

        match self.registry.reconcile(&intent) {
            Ok(event) => {
                log::info!("{}", event);
                true
            }
            Err(e) => {
                log::warn!("Dropping feed update '{}': {}", intent.to_line(), e);
                false
            }
        }
    }

    fn transition(&self, next: FeedState) {
        let previous = self.state_tx.send_replace(next);
        if previous != next {
            log::debug!("Feed state: {} -> {}", previous, next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_on_applies_and_skips() {
        let registry = Arc::new(SpotRegistry::new());
        let listener = FeedListener::new(FeedConfig::default(), Arc::clone(&registry));
        let status = listener.status();

        let feed: &[u8] = b"15:ABC123:2024-11-25 14:30:45\n\
                            garbage\n\
                            \n\
                            41:XYZ999:now\n\
                            2:AB1234:now\n\
                            3:DEF456\n";
        let report = listener.run_on(feed).await;

        assert_eq!(report.applied, 2);
        assert_eq!(report.skipped, 3);
        assert!(matches!(report.ended_by, ParkingError::ConnectionClosed(_)));
        assert_eq!(registry.plate_at(14).unwrap(), "ABC123");
        assert_eq!(registry.plate_at(2).unwrap(), "DEF456");
        assert!(!registry.is_occupied(1).unwrap());
        assert_eq!(status.state(), FeedState::Disconnected);
        assert!(status.is_local_mode());
    }

    #[tokio::test]
    async fn test_repeated_plate_toggles_exit() {
        let registry = Arc::new(SpotRegistry::new());
        let listener = FeedListener::new(FeedConfig::default(), Arc::clone(&registry));

        let feed: &[u8] = b"7:ABC123:t1\n7:ABC123:t2\n";
        let report = listener.run_on(feed).await;

        assert_eq!(report.applied, 2);
        assert!(!registry.is_occupied(6).unwrap());
    }

    #[tokio::test]
    async fn test_extreme_spot_numbers_are_skipped() {
        let registry = Arc::new(SpotRegistry::new());
        let listener = FeedListener::new(FeedConfig::default(), Arc::clone(&registry));

        let feed: &[u8] = b"-9223372036854775808:ABC123:t1\n\
                            99999999999999999999:ABC123:t2\n\
                            5:ABC123:t3\n";
        let report = listener.run_on(feed).await;

        assert_eq!(report.skipped, 2);
        assert_eq!(report.applied, 1);
        assert_eq!(registry.find_plate("ABC123"), Some(4));
    }

    #[test]
    fn test_feed_config_default_addr() {
        assert_eq!(FeedConfig::default().addr(), "localhost:8080");
    }
}
