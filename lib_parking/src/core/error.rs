use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// # Parking Error
///
/// Every failure the occupancy engine can report. Registry variants are handed back
/// to whoever invoked the operation; decode and connection variants are consumed by
/// the feed listener and only ever surface through logs or its final report.
pub enum ParkingError {
    /// The spot index is outside `[0, TOTAL_SPOTS)`.
    #[error("Spot index {index} is out of range (0..{total})")]
    OutOfRange { index: i64, total: usize },

    /// The target spot already holds a vehicle.
    #[error("Spot index {index} is already occupied by {plate}")]
    AlreadyOccupied { index: usize, plate: String },

    /// A plate lookup was made against an empty spot.
    #[error("Spot index {index} is not occupied")]
    NotOccupied { index: usize },

    /// No spot currently holds the plate.
    #[error("Plate {0} is not parked")]
    PlateNotFound(String),

    /// The plate is live in another spot; a plate may only be parked once.
    #[error("Plate {plate} is already parked at spot index {index}")]
    DuplicatePlate { plate: String, index: usize },

    /// The plate does not match the `AAA000` format.
    #[error("Invalid plate '{0}'. Expected format: AAA000")]
    InvalidPlate(String),

    /// The wire line does not follow `<spot>:<plate>[:<timestamp>]`.
    #[error("Malformed message '{line}': {reason}")]
    MalformedMessage { line: String, reason: String },

    /// The feed endpoint could not be reached.
    #[error("Failed to connect to feed at {addr}: {reason}")]
    ConnectionFailed { addr: String, reason: String },

    /// The feed stream ended or could no longer be read.
    #[error("Feed connection closed: {0}")]
    ConnectionClosed(String),
}

/// Result alias used across the crate.
pub type ParkingResult<T> = Result<T, ParkingError>;
