//! Global Tag-Tracking Constants.
//!
//! This module defines the fixed geometry shared by the tag table and the line
//! request builder. It includes:
//! 1. **Granule Geometry:** The size of the region covered by one capability tag.
//! 2. **Mask Geometry:** The width of the packed per-line tag masks.
//! 3. **Line Defaults:** The cache line size assumed when none is configured.

/// Size in bytes of one capability granule (one tag bit per granule).
pub const GRANULE_BYTES: u64 = 16;

/// Number of granules representable in a line request mask (`u16`).
pub const LINE_TAG_BITS: u32 = u16::BITS;

/// Largest line size whose granules fit in the request masks (16 granules).
pub const MAX_LINE_BYTES: u64 = GRANULE_BYTES * LINE_TAG_BITS as u64;

/// Default cache line size in bytes.
pub const DEFAULT_LINE_BYTES: u64 = 64;
