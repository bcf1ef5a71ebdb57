//! Pending capability-tag claim.
//!
//! A capability-tag marker announces the tag of the very next qualifying
//! access. The announcement is held here until that access consumes it.

use crate::common::ProtocolViolation;

/// Single-slot claim state embedded in the tag table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClaimState {
    /// No marker is waiting to be consumed.
    #[default]
    Idle,
    /// A marker announced this tag for the next qualifying access.
    PendingTag(bool),
}

impl ClaimState {
    /// Records a marker's announced tag.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolViolation::DoubleClaim`] if a claim is already
    /// pending; the pending claim is left in place.
    pub const fn claim(&mut self, tag: bool) -> Result<(), ProtocolViolation> {
        match *self {
            Self::Idle => {
                *self = Self::PendingTag(tag);
                Ok(())
            }
            Self::PendingTag(pending) => Err(ProtocolViolation::DoubleClaim {
                pending,
                incoming: tag,
            }),
        }
    }

    /// Consumes the pending claim, returning to `Idle`.
    pub fn take(&mut self) -> Option<bool> {
        match std::mem::take(self) {
            Self::Idle => None,
            Self::PendingTag(tag) => Some(tag),
        }
    }

    /// Returns the pending tag without consuming it.
    pub const fn pending(self) -> Option<bool> {
        match self {
            Self::Idle => None,
            Self::PendingTag(tag) => Some(tag),
        }
    }
}
