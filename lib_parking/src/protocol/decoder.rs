//! # Feed Message Decoder
//!
//! Wire grammar, one message per line:
//!
//! ```text
//! <spot>:<plate>[:<timestamp>]
//! ```
//!
//! `<spot>` is 1-based. Everything after the second colon is the timestamp, which
//! usually contains colons of its own (`2024-11-25 14:30:45`). Plates are passed
//! through untouched; they are validated when the registry is mutated.

use std::num::IntErrorKind;

use crate::core::error::{ParkingError, ParkingResult};
use crate::core::registry::TOTAL_SPOTS;
use crate::utils::time::current_timestamp;

const FIELD_SEPARATOR: char = ':';

/// A decoded feed message, consumed immediately by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateIntent {
    /// Zero-based spot index, already checked against the facility size.
    pub target_index: usize,
    /// Raw plate text from the wire.
    pub plate: String,
    pub timestamp: String,
}

impl UpdateIntent {
    pub fn new(target_index: usize, plate: &str, timestamp: &str) -> Self {
        Self {
            target_index,
            plate: plate.to_string(),
            timestamp: timestamp.to_string(),
        }
    }

    /// Renders the intent in wire form, with the spot back to 1-based.
    pub fn to_line(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.target_index + 1,
            self.plate,
            self.timestamp,
            sep = FIELD_SEPARATOR
        )
    }
}

/// Decodes one line, stamping it with the current local time if it carries none.
pub fn decode(line: &str) -> ParkingResult<UpdateIntent> {
    decode_line(line, current_timestamp)
}

/// Decodes one line, using `fallback` when the timestamp field is absent.
pub fn decode_with_fallback(line: &str, fallback: &str) -> ParkingResult<UpdateIntent> {
    decode_line(line, || fallback.to_string())
}

fn decode_line<F>(line: &str, fallback: F) -> ParkingResult<UpdateIntent>
where
    F: FnOnce() -> String,
{
    let line = line.trim();
    let malformed = |reason: &str| ParkingError::MalformedMessage {
        line: line.to_string(),
        reason: reason.to_string(),
    };

    let (spot_field, rest) = line
        .split_once(FIELD_SEPARATOR)
        .ok_or_else(|| malformed("missing ':' separator"))?;

    let (plate, timestamp) = match rest.split_once(FIELD_SEPARATOR) {
        Some((plate, timestamp)) => (plate, timestamp.to_string()),
        None => (rest, fallback()),
    };

    let out_of_range = |index: i64| ParkingError::OutOfRange {
        index,
        total: TOTAL_SPOTS,
    };

    // Numeric fields too wide for i64 are still spot numbers, just impossible ones.
    let spot: i64 = match spot_field.trim().parse() {
        Ok(spot) => spot,
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => return Err(out_of_range(i64::MAX)),
        Err(e) if *e.kind() == IntErrorKind::NegOverflow => return Err(out_of_range(i64::MIN)),
        Err(_) => return Err(malformed("spot is not a number")),
    };

    let index = spot.checked_sub(1).unwrap_or(i64::MIN);
    if !(0..TOTAL_SPOTS as i64).contains(&index) {
        return Err(out_of_range(index));
    }

    Ok(UpdateIntent {
        target_index: index as usize,
        plate: plate.to_string(),
        timestamp,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rejoins_timestamp() {
        let intent = decode("15:ABC123:2024-11-25 14:30:45").unwrap();
        assert_eq!(intent.target_index, 14);
        assert_eq!(intent.plate, "ABC123");
        assert_eq!(intent.timestamp, "2024-11-25 14:30:45");
    }

    #[test]
    fn test_decode_without_timestamp_uses_fallback() {
        let intent = decode_with_fallback("1:XYZ789", "2024-01-01 00:00:00").unwrap();
        assert_eq!(intent, UpdateIntent::new(0, "XYZ789", "2024-01-01 00:00:00"));
    }

    #[test]
    fn test_decode_without_timestamp_stamps_now() {
        let intent = decode("40:XYZ789\r\n").unwrap();
        assert_eq!(intent.target_index, 39);
        // YYYY-MM-DD HH:MM:SS
        assert_eq!(intent.timestamp.len(), 19);
        assert_eq!(intent.timestamp.matches(':').count(), 2);
    }

    #[test]
    fn test_decode_keeps_empty_timestamp_field() {
        let intent = decode_with_fallback("3:ABC123:", "unused").unwrap();
        assert_eq!(intent.timestamp, "");
    }

    #[test]
    fn test_decode_does_not_validate_plate() {
        let intent = decode_with_fallback(" 2 :ab:x", "unused").unwrap();
        assert_eq!(intent.target_index, 1);
        assert_eq!(intent.plate, "ab");
    }

    #[test]
    fn test_decode_malformed() {
        for line in ["", "15", "ABC123", "x:ABC123:now", "1.5:ABC123"] {
            assert!(
                matches!(decode(line), Err(ParkingError::MalformedMessage { .. })),
                "expected '{}' to be malformed",
                line
            );
        }
    }

    #[test]
    fn test_decode_out_of_range() {
        assert_eq!(
            decode("41:XYZ999:now"),
            Err(ParkingError::OutOfRange { index: 40, total: 40 })
        );
        assert_eq!(
            decode("0:XYZ999:now"),
            Err(ParkingError::OutOfRange { index: -1, total: 40 })
        );
        assert_eq!(
            decode("-9223372036854775808:ABC123:x"),
            Err(ParkingError::OutOfRange { index: i64::MIN, total: 40 })
        );
        assert_eq!(
            decode("99999999999999999999:ABC123:x"),
            Err(ParkingError::OutOfRange { index: i64::MAX, total: 40 })
        );
        assert_eq!(
            decode("-99999999999999999999:ABC123:x"),
            Err(ParkingError::OutOfRange { index: i64::MIN, total: 40 })
        );
    }

    #[test]
    fn test_to_line_is_one_based() {
        let intent = UpdateIntent::new(14, "ABC123", "2024-11-25 14:30:45");
        assert_eq!(intent.to_line(), "15:ABC123:2024-11-25 14:30:45");
    }
}
