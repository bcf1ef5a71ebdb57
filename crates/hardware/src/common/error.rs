//! Tag-tracking error definitions.
//!
//! This module defines the data-integrity errors raised while replaying a trace.
//! It provides:
//! 1. **Protocol Violations:** Record sequences that break the marker/access pairing.
//! 2. **Precondition Violations:** Malformed line queries and unrepresentable address ranges.
//! 3. **Umbrella Error:** `TagError`, returned by every fallible tag table operation.
//!
//! None of these are locally recoverable: once raised, the tag knowledge of the
//! affected thread can no longer be trusted and its replay must stop.

use thiserror::Error;

use super::data::TraceRecord;

/// A record sequence that breaks the marker/access claim protocol.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A capability-tag marker arrived while an earlier claim was still pending.
    #[error("capability-tag marker (tag {incoming}) arrived while tag {pending} was still pending")]
    DoubleClaim {
        /// Tag value of the unconsumed claim.
        pending: bool,
        /// Tag value carried by the rejected marker.
        incoming: bool,
    },

    /// A capability-tag marker carried a value other than 0 or 1.
    #[error("capability-tag marker value {0} is not 0 or 1")]
    InvalidTagValue(u64),

    /// A data write was not preceded by a capability-tag marker.
    #[error("data write at {addr:#x} has no preceding capability-tag marker")]
    UnclaimedWrite {
        /// Address of the write.
        addr: u64,
    },

    /// An instruction fetch consumed a pending tag of 1.
    #[error("instruction fetch at {addr:#x} observed with a pending tag of 1")]
    TaggedInstructionFetch {
        /// Address of the fetch.
        addr: u64,
    },

    /// A prefetch was observed while a claim was pending.
    #[error("prefetch at {addr:#x} observed with a pending tag of {pending}")]
    ClaimedPrefetch {
        /// Address of the prefetch.
        addr: u64,
        /// Tag value of the pending claim.
        pending: bool,
    },
}

/// A query or address range the tag tracker cannot represent.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PreconditionViolation {
    /// The requested line size is not a power of two.
    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(u64),

    /// The requested line size is not a whole number of granules.
    #[error("block size {0} is not a multiple of the 16-byte granule")]
    BlockSizeNotGranuleMultiple(u64),

    /// The requested line has more granules than the request masks hold.
    #[error("block size {0} exceeds the 256-byte tag mask width")]
    BlockSizeTooWide(u64),

    /// The queried access crosses a line boundary.
    #[error("access of {size} bytes at {addr:#x} straddles a {block_size}-byte line boundary")]
    StraddlesLine {
        /// Address of the access.
        addr: u64,
        /// Size of the access in bytes.
        size: u64,
        /// Queried line size.
        block_size: u64,
    },

    /// The queried access covers no bytes, so it lies in no line.
    #[error("zero-byte access at {addr:#x} cannot be mapped to a line")]
    EmptyAccess {
        /// Address of the access.
        addr: u64,
    },

    /// The access range runs past the end of the 64-bit address space.
    #[error("access of {size} bytes at {addr:#x} overflows the address space")]
    AddressOverflow {
        /// Address of the access.
        addr: u64,
        /// Size of the access in bytes.
        size: u64,
    },

    /// A line was queried for a record that is not a memory access.
    #[error("record {0:?} is not a memory access")]
    NotAnAccess(TraceRecord),
}

/// Error returned by tag table operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TagError {
    /// The record stream broke the claim protocol.
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// A query or access range violated a precondition.
    #[error("precondition violation: {0}")]
    Precondition(#[from] PreconditionViolation),
}
