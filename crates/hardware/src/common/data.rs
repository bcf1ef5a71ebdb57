//! Trace Record Types.
//!
//! This module defines the decoded records consumed from a captured memory trace.
//! These types are used for the following:
//! 1. **Tag Tracking:** Driving the tag table's claim protocol and granule updates.
//! 2. **Line Queries:** Locating the accessed line for fill requests.
//! 3. **Trace Input:** Deserializing records from JSON-lines trace files.

use serde::{Deserialize, Serialize};

/// Subtype of an out-of-band marker record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerKind {
    /// Announces the capability tag (0 or 1) of the next qualifying access.
    CapabilityTag,
    /// Any other marker subtype (timestamps, CPU ids, ...). Ignored by tag tracking.
    #[serde(other)]
    Other,
}

/// A single decoded trace record.
///
/// Records arrive one at a time, per simulated thread, in recorded order.
/// Serialized as a JSON object tagged by `"type"`, for example
/// `{"type":"data_read","addr":4096,"size":16}` or
/// `{"type":"marker","marker":"capability_tag","value":1}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceRecord {
    /// Instruction fetch of `size` bytes at `addr`.
    InstructionFetch {
        /// Address of the first fetched byte.
        addr: u64,
        /// Number of bytes fetched.
        size: u64,
    },
    /// Data load of `size` bytes at `addr`.
    DataRead {
        /// Address of the first loaded byte.
        addr: u64,
        /// Number of bytes loaded.
        size: u64,
    },
    /// Data store of `size` bytes at `addr`.
    DataWrite {
        /// Address of the first stored byte.
        addr: u64,
        /// Number of bytes stored.
        size: u64,
    },
    /// Software or hardware prefetch of `size` bytes at `addr`.
    DataPrefetch {
        /// Address of the first prefetched byte.
        addr: u64,
        /// Number of bytes prefetched.
        size: u64,
    },
    /// Out-of-band metadata record.
    Marker {
        /// Marker subtype.
        marker: MarkerKind,
        /// Marker payload; for [`MarkerKind::CapabilityTag`] it must be 0 or 1.
        value: u64,
    },
    /// Any record kind not relevant to tag tracking.
    #[serde(other)]
    Other,
}

/// Classification of a memory access record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Instruction fetch; never carries a capability tag.
    InstructionFetch,
    /// Data load.
    Read,
    /// Data store.
    Write,
    /// Prefetch.
    Prefetch,
}

/// The memory-access view of a record: what was touched and how.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemAccess {
    /// Access classification.
    pub kind: AccessKind,
    /// Address of the first accessed byte.
    pub addr: u64,
    /// Number of bytes accessed.
    pub size: u64,
}

impl TraceRecord {
    /// Returns the access described by this record, or `None` for markers and
    /// other non-access records.
    pub const fn access(&self) -> Option<MemAccess> {
        let (kind, addr, size) = match *self {
            Self::InstructionFetch { addr, size } => (AccessKind::InstructionFetch, addr, size),
            Self::DataRead { addr, size } => (AccessKind::Read, addr, size),
            Self::DataWrite { addr, size } => (AccessKind::Write, addr, size),
            Self::DataPrefetch { addr, size } => (AccessKind::Prefetch, addr, size),
            Self::Marker { .. } | Self::Other => return None,
        };
        Some(MemAccess { kind, addr, size })
    }

    /// Builds the record for an access of the given kind.
    pub const fn from_access(access: MemAccess) -> Self {
        let MemAccess { kind, addr, size } = access;
        match kind {
            AccessKind::InstructionFetch => Self::InstructionFetch { addr, size },
            AccessKind::Read => Self::DataRead { addr, size },
            AccessKind::Write => Self::DataWrite { addr, size },
            AccessKind::Prefetch => Self::DataPrefetch { addr, size },
        }
    }

    /// Builds a capability-tag marker carrying `value`.
    pub const fn tag_marker(value: u64) -> Self {
        Self::Marker {
            marker: MarkerKind::CapabilityTag,
            value,
        }
    }
}
