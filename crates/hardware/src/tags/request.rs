//! Cache line fill requests.
//!
//! Packs the tag table's per-granule knowledge for one aligned line into a pair
//! of bitmasks, keeping "unknown" distinct from "false".

use serde::Serialize;
use tracing::trace;

use super::table::TagTable;
use crate::common::constants::{GRANULE_BYTES, LINE_TAG_BITS, MAX_LINE_BYTES};
use crate::common::{GranuleAddr, PreconditionViolation, TagError, TraceRecord, aligned_span};

/// Kind of request handed to the downstream cache model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRequestKind {
    /// A line being brought in on a read miss.
    Fill,
}

/// Known tag bits for one aligned cache line.
///
/// Bit `i` of both masks describes the granule at `addr + 16 * i`. A `tags` bit
/// is only meaningful where the matching `tags_known` bit is set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LineRequest {
    /// Request kind.
    pub kind: LineRequestKind,
    /// Line size in bytes.
    pub size: u64,
    /// Line base address, aligned to `size`.
    pub addr: u64,
    /// Tag value of each known granule.
    pub tags: u16,
    /// Set for every granule whose tag has been observed.
    pub tags_known: u16,
}

impl LineRequest {
    /// Returns the number of granules in the line.
    pub const fn granules(&self) -> u32 {
        (self.size / GRANULE_BYTES) as u32
    }

    /// Returns the tag of granule `index`: `Some(tag)` if known, `None` if
    /// unknown or outside the line.
    pub const fn tag(&self, index: u32) -> Option<bool> {
        if index >= self.granules() {
            return None;
        }
        let bit = 1u16 << index;
        if self.tags_known & bit == 0 {
            None
        } else {
            Some(self.tags & bit != 0)
        }
    }

    /// Returns `true` if every granule of the line has a known tag.
    pub const fn is_fully_known(&self) -> bool {
        let mask = line_mask(self.granules());
        self.tags_known & mask == mask
    }
}

/// Mask with the low `granules` bits set.
const fn line_mask(granules: u32) -> u16 {
    if granules >= LINE_TAG_BITS {
        u16::MAX
    } else {
        (1u16 << granules) - 1
    }
}

/// Checks that `block_size` is usable as a line size for fill requests.
///
/// # Errors
///
/// Returns a [`PreconditionViolation`] if `block_size` is not a power of two,
/// not a multiple of the 16-byte granule, or wider than 256 bytes.
pub const fn validate_block_size(block_size: u64) -> Result<(), PreconditionViolation> {
    if !block_size.is_power_of_two() {
        return Err(PreconditionViolation::BlockSizeNotPowerOfTwo(block_size));
    }
    if block_size % GRANULE_BYTES != 0 {
        return Err(PreconditionViolation::BlockSizeNotGranuleMultiple(block_size));
    }
    if block_size > MAX_LINE_BYTES {
        return Err(PreconditionViolation::BlockSizeTooWide(block_size));
    }
    Ok(())
}

impl TagTable {
    /// Builds the fill request for the line of `block_size` bytes holding the
    /// access described by `record`.
    ///
    /// Read-only: neither the table nor the pending claim is touched, so the
    /// same query always yields the same request until the next update.
    ///
    /// # Arguments
    ///
    /// * `record` - An instruction fetch or data access record.
    /// * `block_size` - Line size in bytes; a power of two, a multiple of 16,
    ///   and at most 256.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Precondition`] if `block_size` is invalid, the record
    /// is not an access, the access is empty, or it straddles two lines.
    pub fn build_fill_request(
        &self,
        record: &TraceRecord,
        block_size: u64,
    ) -> Result<LineRequest, TagError> {
        validate_block_size(block_size)?;
        let access = record
            .access()
            .ok_or(PreconditionViolation::NotAnAccess(*record))?;
        if access.size == 0 {
            return Err(PreconditionViolation::EmptyAccess { addr: access.addr }.into());
        }

        let line = aligned_span(access.addr, access.size, block_size)?;
        if line.end - line.start != block_size {
            return Err(PreconditionViolation::StraddlesLine {
                addr: access.addr,
                size: access.size,
                block_size,
            }
            .into());
        }

        let mut request = LineRequest {
            kind: LineRequestKind::Fill,
            size: block_size,
            addr: line.start,
            tags: 0,
            tags_known: 0,
        };
        for index in 0..(block_size / GRANULE_BYTES) as u32 {
            debug_assert!(index < LINE_TAG_BITS);
            let granule = GranuleAddr::containing(line.start + GRANULE_BYTES * index as u64);
            if let Some(&tag) = self.table.get(&granule) {
                let bit = 1u16 << index;
                request.tags_known |= bit;
                if tag {
                    request.tags |= bit;
                }
            }
        }

        trace!(
            addr = format_args!("{:#x}", request.addr),
            size = request.size,
            tags = format_args!("{:#06x}", request.tags),
            tags_known = format_args!("{:#06x}", request.tags_known),
            "fill request built"
        );
        Ok(request)
    }
}
