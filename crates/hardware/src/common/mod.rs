//! Common types and constants used throughout the tag-tracking replay.
//!
//! This module provides the building blocks shared by the tag table, the
//! replay driver and the CLI. It includes:
//! 1. **Address Types:** The granule key type and alignment arithmetic.
//! 2. **Constants:** Granule size and tag mask geometry.
//! 3. **Trace Records:** The decoded access and marker records being replayed.
//! 4. **Error Handling:** Protocol and precondition violations.

/// Granule address type and alignment helpers.
pub mod addr;

/// Granule and line geometry constants.
pub mod constants;

/// Trace record definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{GranuleAddr, aligned_span, granule_span};
pub use constants::{GRANULE_BYTES, MAX_LINE_BYTES};
pub use data::{AccessKind, MarkerKind, MemAccess, TraceRecord};
pub use error::{PreconditionViolation, ProtocolViolation, TagError};
