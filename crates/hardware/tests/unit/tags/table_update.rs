//! # Tag Table Update Tests
//!
//! Verifies which granules an access writes and how later writes replace
//! earlier knowledge.

use crate::common::builder::trace::TraceBuilder;
use crate::common::harness::TestContext;
use tagsim_core::common::{PreconditionViolation, TagError, TraceRecord};
use tagsim_core::tags::{ClaimState, UpdateOutcome};

fn known(ctx: &TestContext) -> Vec<(u64, bool)> {
    let mut granules: Vec<_> = ctx.table.iter().map(|(g, tag)| (g.val(), tag)).collect();
    granules.sort_unstable();
    granules
}

/// An unaligned access touches every granule overlapping its byte range.
#[test]
fn unaligned_access_tags_overlapping_granules() {
    let ctx = TestContext::new().replay(TraceBuilder::new().cap_write(0x1008, 0x20, true));
    assert_eq!(known(&ctx), vec![(0x1000, true), (0x1010, true), (0x1020, true)]);
}

/// A small access inside one granule tags only that granule.
#[test]
fn small_access_tags_one_granule() {
    let ctx = TestContext::new().replay(TraceBuilder::new().fetch(0x4002, 2));
    assert_eq!(known(&ctx), vec![(0x4000, false)]);
}

/// A 64-byte line write tags four granules.
#[test]
fn line_write_reports_granule_count() {
    let mut ctx = TestContext::new();
    ctx.apply(TraceRecord::tag_marker(0)).unwrap();
    assert_eq!(
        ctx.apply(TraceRecord::DataWrite {
            addr: 0x8000,
            size: 64
        }),
        Ok(UpdateOutcome::Tagged {
            tag: false,
            granules: 4
        })
    );
    assert_eq!(ctx.table.len(), 4);
}

/// A zero-byte aligned access consumes the claim but touches no granule.
#[test]
fn empty_access_consumes_claim_without_tagging() {
    let mut ctx = TestContext::new();
    ctx.apply(TraceRecord::tag_marker(1)).unwrap();
    assert_eq!(
        ctx.apply(TraceRecord::DataRead {
            addr: 0x1000,
            size: 0
        }),
        Ok(UpdateOutcome::Tagged {
            tag: true,
            granules: 0
        })
    );
    assert!(ctx.table.is_empty());
    assert_eq!(ctx.table.claim_state(), ClaimState::Idle);
}

/// A zero-byte access inside a granule still tags the granule it points into.
#[test]
fn empty_unaligned_access_tags_its_granule() {
    let mut ctx = TestContext::new();
    ctx.apply(TraceRecord::tag_marker(1)).unwrap();
    assert_eq!(
        ctx.apply(TraceRecord::DataWrite {
            addr: 0x1001,
            size: 0
        }),
        Ok(UpdateOutcome::Tagged {
            tag: true,
            granules: 1
        })
    );
    assert_eq!(known(&ctx), vec![(0x1000, true)]);
    assert_eq!(ctx.table.claim_state(), ClaimState::Idle);
}

/// The latest write to a granule wins.
#[test]
fn later_write_overrides_earlier() {
    let ctx = TestContext::new().replay(
        TraceBuilder::new()
            .cap_write(0x1000, 16, true)
            .cap_write(0x1000, 16, false),
    );
    assert_eq!(ctx.table.tag_at(0x1000), Some(false));
    assert_eq!(ctx.table.len(), 1);
}

/// Overlapping writes replace only the granules they touch.
#[test]
fn partial_overwrite_keeps_other_granules() {
    let ctx = TestContext::new().replay(
        TraceBuilder::new()
            .cap_write(0x1000, 64, true)
            .cap_write(0x1010, 16, false),
    );
    assert_eq!(
        known(&ctx),
        vec![
            (0x1000, true),
            (0x1010, false),
            (0x1020, true),
            (0x1030, true)
        ]
    );
}

/// `tag_at` answers for any byte of a granule and `None` for unseen ones.
#[test]
fn tag_at_any_byte_of_granule() {
    let ctx = TestContext::new().replay(TraceBuilder::new().cap_read(0x1000, 16, true));
    assert_eq!(ctx.table.tag_at(0x100f), Some(true));
    assert_eq!(ctx.table.tag_at(0x1010), None);
    assert_eq!(ctx.table.tag_at(0x0ff0), None);
}

/// An access running off the end of the address space fails and changes nothing.
#[test]
fn overflowing_access_is_rejected_atomically() {
    let mut ctx = TestContext::new();
    ctx.apply(TraceRecord::tag_marker(1)).unwrap();
    assert_eq!(
        ctx.apply(TraceRecord::DataRead {
            addr: u64::MAX - 7,
            size: 16
        }),
        Err(TagError::Precondition(PreconditionViolation::AddressOverflow {
            addr: u64::MAX - 7,
            size: 16
        }))
    );
    assert!(ctx.table.is_empty());
    assert_eq!(ctx.table.claim_state(), ClaimState::PendingTag(true));
}

/// Separate tables never share state.
#[test]
fn tables_are_independent() {
    let a = TestContext::new().replay(TraceBuilder::new().cap_write(0x1000, 16, true));
    let b = TestContext::new();
    assert_eq!(a.table.tag_at(0x1000), Some(true));
    assert_eq!(b.table.tag_at(0x1000), None);
}
