//! # Data Ingestors Module
//!
//! Clients for external sources of occupancy updates. Each ingestor owns its
//! connection lifecycle and pushes decoded updates into the shared registry from
//! its own task, without blocking whoever is reading the registry.
//!
//! ## Contained Modules:
//! - **`feed_listener`**: the single-shot TCP client for the newline-delimited
//!   parking feed.

/// The TCP client for the real-time parking feed.
pub mod feed_listener;

// --- Public API Re-exports ---
pub use feed_listener::{FeedConfig, FeedListener, FeedReport, FeedState, FeedStatus};
