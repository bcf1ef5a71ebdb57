//! Granule addresses and alignment arithmetic.
//!
//! This module defines the key type of the tag table and the alignment helpers
//! used to map byte ranges onto granules and cache lines. It provides:
//! 1. **Type Safety:** `GranuleAddr` can only hold a 16-byte-aligned address.
//! 2. **Alignment:** Power-of-two floor/ceiling helpers with overflow checking.
//! 3. **Span Mapping:** The half-open granule range covered by an access.

use std::fmt;
use std::ops::Range;

use super::constants::GRANULE_BYTES;
use super::error::PreconditionViolation;

/// Address of a 16-byte capability granule.
///
/// The wrapped value is always a multiple of [`GRANULE_BYTES`]; the only
/// constructor rounds down, so a misaligned key cannot reach the table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GranuleAddr(u64);

impl GranuleAddr {
    /// Returns the granule containing the byte at `addr`.
    #[inline(always)]
    pub const fn containing(addr: u64) -> Self {
        Self(align_down(addr, GRANULE_BYTES))
    }

    /// Returns the raw 64-bit address of the first byte of the granule.
    #[inline(always)]
    pub const fn val(self) -> u64 {
        self.0
    }
}

impl fmt::Display for GranuleAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Rounds `addr` down to a multiple of `align`.
///
/// `align` must be a non-zero power of two.
#[inline(always)]
pub const fn align_down(addr: u64, align: u64) -> u64 {
    addr & !(align - 1)
}

/// Rounds `addr` up to a multiple of `align`.
///
/// `align` must be a non-zero power of two. Returns `None` if the rounded
/// value does not fit in 64 bits.
#[inline(always)]
pub const fn align_up(addr: u64, align: u64) -> Option<u64> {
    match addr.checked_add(align - 1) {
        Some(bumped) => Some(bumped & !(align - 1)),
        None => None,
    }
}

/// Computes the `align`-aligned byte range enclosing `[addr, addr + size)`.
///
/// The start is rounded down and the end rounded up, so an empty access at an
/// aligned address yields an empty range.
///
/// # Errors
///
/// Returns [`PreconditionViolation::AddressOverflow`] if the end of the access
/// or its rounded-up end exceeds the 64-bit address space.
pub fn aligned_span(addr: u64, size: u64, align: u64) -> Result<Range<u64>, PreconditionViolation> {
    let overflow = || PreconditionViolation::AddressOverflow { addr, size };
    let end = addr.checked_add(size).ok_or_else(overflow)?;
    let end = align_up(end, align).ok_or_else(overflow)?;
    Ok(align_down(addr, align)..end)
}

/// Computes the granule-aligned byte range touched by `[addr, addr + size)`.
///
/// # Errors
///
/// See [`aligned_span`].
pub fn granule_span(addr: u64, size: u64) -> Result<Range<u64>, PreconditionViolation> {
    aligned_span(addr, size, GRANULE_BYTES)
}
