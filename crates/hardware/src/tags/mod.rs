//! Capability tag tracking.
//!
//! This module reconstructs per-granule capability tags from a replayed record
//! stream and answers line-granularity queries about them. It provides:
//! 1. **Claim State:** The single-slot marker/access pairing protocol.
//! 2. **Tag Table:** The granule-to-tag map mutated by `update`.
//! 3. **Line Requests:** Read-only packing of a line's known tags into bitmasks.

/// Pending capability-tag claim state machine.
pub mod claim;

/// Fill request builder and line request types.
pub mod request;

/// Granule tag table.
pub mod table;

pub use self::claim::ClaimState;
pub use self::request::{LineRequest, LineRequestKind, validate_block_size};
pub use self::table::{TagTable, UpdateOutcome};
