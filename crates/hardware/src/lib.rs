//! Capability-tag tracking for offline memory trace replay.
//!
//! This crate reconstructs per-granule capability validity tags (one bit per
//! 16-byte granule) from a captured record stream and answers cache-line
//! queries about them:
//! 1. **Common:** Trace records, granule addresses, geometry constants, and errors.
//! 2. **Tags:** The tag table, its marker/access claim protocol, and the fill request builder.
//! 3. **Simulation:** Trace reading and per-thread replay feeding a downstream cache model.
//! 4. **Configuration and statistics:** Replay settings and counters.

/// Common types and constants (addresses, records, errors).
pub mod common;
/// Replay configuration (defaults, JSON loading, validation).
pub mod config;
/// Trace reader and replay driver.
pub mod sim;
/// Replay statistics collection and reporting.
pub mod stats;
/// Tag table, claim state, and line requests.
pub mod tags;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Error raised by tag table operations.
pub use crate::common::TagError;
/// Per-thread tag table; feed it records with `TagTable::update`.
pub use crate::tags::{LineRequest, TagTable};
