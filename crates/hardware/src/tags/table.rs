//! Granule tag table.
//!
//! The table reconstructs, purely from the record stream, the last known
//! capability tag of every granule a thread has touched. It grows for the
//! lifetime of the replay and is never evicted.

use std::collections::HashMap;
use std::ops::Range;

use tracing::{debug, trace};

use super::claim::ClaimState;
use crate::common::{
    AccessKind, GRANULE_BYTES, GranuleAddr, MarkerKind, ProtocolViolation, TagError,
    TraceRecord, granule_span,
};

/// What a successful [`TagTable::update`] did with its record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// A capability-tag marker was recorded as the pending claim.
    Claimed(bool),
    /// An access wrote `tag` into `granules` granules and consumed any claim.
    Tagged {
        /// Tag value written.
        tag: bool,
        /// Number of granules written.
        granules: u64,
    },
    /// A load or prefetch with no pending claim: a non-capability access whose
    /// tags are unknown. Nothing changed.
    SkippedNonCapability,
    /// The record plays no part in tag tracking.
    Ignored,
}

/// Per-thread table of known granule tags plus the pending claim.
///
/// One table serves exactly one simulated thread's record stream; records
/// must be applied in recorded order.
#[derive(Clone, Debug, Default)]
pub struct TagTable {
    pub(super) table: HashMap<GranuleAddr, bool>,
    claim: ClaimState,
}

impl TagTable {
    /// Creates an empty table with no pending claim.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one record to the table.
    ///
    /// Markers set the pending claim; accesses consume it and write their tag
    /// over every granule they touch. A failed update changes nothing.
    ///
    /// # Arguments
    ///
    /// * `record` - The next record of this thread's stream.
    ///
    /// # Errors
    ///
    /// * [`ProtocolViolation::InvalidTagValue`] - marker value other than 0 or 1.
    /// * [`ProtocolViolation::DoubleClaim`] - marker while a claim is pending.
    /// * [`ProtocolViolation::TaggedInstructionFetch`] - fetch with a pending tag of 1.
    /// * [`ProtocolViolation::UnclaimedWrite`] - write with no pending claim.
    /// * [`ProtocolViolation::ClaimedPrefetch`] - prefetch with a pending claim.
    /// * [`PreconditionViolation::AddressOverflow`](crate::common::PreconditionViolation::AddressOverflow)
    ///   - access running past the end of the address space.
    pub fn update(&mut self, record: &TraceRecord) -> Result<UpdateOutcome, TagError> {
        let access = match *record {
            TraceRecord::Marker {
                marker: MarkerKind::CapabilityTag,
                value,
            } => {
                let tag = match value {
                    0 => false,
                    1 => true,
                    other => return Err(ProtocolViolation::InvalidTagValue(other).into()),
                };
                self.claim.claim(tag)?;
                debug!(tag, "capability tag claimed");
                return Ok(UpdateOutcome::Claimed(tag));
            }
            _ => match record.access() {
                Some(access) => access,
                None => return Ok(UpdateOutcome::Ignored),
            },
        };

        let tag = match (access.kind, self.claim.pending()) {
            (AccessKind::InstructionFetch, Some(true)) => {
                return Err(ProtocolViolation::TaggedInstructionFetch { addr: access.addr }.into());
            }
            (AccessKind::InstructionFetch, _) => false,
            (AccessKind::Write, None) => {
                return Err(ProtocolViolation::UnclaimedWrite { addr: access.addr }.into());
            }
            (AccessKind::Read | AccessKind::Prefetch, None) => {
                return Ok(UpdateOutcome::SkippedNonCapability);
            }
            (AccessKind::Prefetch, Some(pending)) => {
                return Err(ProtocolViolation::ClaimedPrefetch {
                    addr: access.addr,
                    pending,
                }
                .into());
            }
            (AccessKind::Read | AccessKind::Write, Some(tag)) => tag,
        };

        let span = granule_span(access.addr, access.size)?;
        self.claim = ClaimState::Idle;
        let granules = self.write_span(span, tag);
        debug!(
            addr = format_args!("{:#x}", access.addr),
            size = access.size,
            tag,
            granules,
            "granules tagged"
        );
        Ok(UpdateOutcome::Tagged { tag, granules })
    }

    fn write_span(&mut self, span: Range<u64>, tag: bool) -> u64 {
        let mut granules = 0;
        for addr in span.step_by(GRANULE_BYTES as usize) {
            let granule = GranuleAddr::containing(addr);
            if let Some(previous) = self.table.insert(granule, tag) {
                if previous != tag {
                    trace!(%granule, previous, tag, "granule tag changed");
                }
            }
            granules += 1;
        }
        granules
    }

    /// Returns the known tag of the granule containing `addr`, or `None` if
    /// that granule has never been written.
    pub fn tag_at(&self, addr: u64) -> Option<bool> {
        self.table.get(&GranuleAddr::containing(addr)).copied()
    }

    /// Returns the number of granules with a known tag.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if no granule tag is known yet.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the current claim state.
    pub const fn claim_state(&self) -> ClaimState {
        self.claim
    }

    /// Iterates over every known granule and its tag, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (GranuleAddr, bool)> + '_ {
        self.table.iter().map(|(&granule, &tag)| (granule, tag))
    }
}
