//! # Plate
//!
//! License plates are the correlation key for exits and replacements, so they are
//! validated once at the mutation boundary and carried around as a [`Plate`] from
//! then on. Both the feed and direct user actions go through [`Plate::parse`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{ParkingError, ParkingResult};

/// Number of characters in a plate (`AAA000`).
pub const PLATE_LEN: usize = 6;
/// Leading characters that must be letters.
const PLATE_ALPHA_PREFIX: usize = 3;

/// A normalized, validated license plate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Plate(String);

impl Plate {
    /// Normalizes and validates a raw plate.
    ///
    /// Surrounding whitespace is trimmed and letters are uppercased before the
    /// format check, so `" abc123 "` becomes `ABC123`.
    pub fn parse(raw: &str) -> ParkingResult<Self> {
        let normalized = normalize(raw);
        if is_valid_format(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(ParkingError::InvalidPlate(normalized))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Trims and uppercases without validating.
///
/// Used where a raw plate has to be compared against live plates even if it would
/// not pass validation (it can then never match one).
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

fn is_valid_format(plate: &str) -> bool {
    let bytes = plate.as_bytes();
    bytes.len() == PLATE_LEN
        && bytes[..PLATE_ALPHA_PREFIX].iter().all(u8::is_ascii_alphabetic)
        && bytes[PLATE_ALPHA_PREFIX..].iter().all(u8::is_ascii_digit)
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Plate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Plate {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Plate {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl TryFrom<String> for Plate {
    type Error = ParkingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Plate::parse(&value)
    }
}

impl From<Plate> for String {
    fn from(plate: Plate) -> Self {
        plate.0
    }
}
