//! # Wire Protocol
//!
//! The feed speaks newline-delimited text, one `<spot>:<plate>[:<timestamp>]`
//! message per line, with no framing, versioning or acknowledgements. This module
//! turns each line into an [`UpdateIntent`] and never touches registry state.

/// Line decoder producing `UpdateIntent`s.
pub mod decoder;

pub use decoder::{decode, decode_with_fallback, UpdateIntent};
