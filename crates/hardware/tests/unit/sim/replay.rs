//! # Replay Driver Tests
//!
//! Verifies per-thread routing, fill request emission, fatal abort on
//! violations, and statistics aggregation of the replay driver.

use mockall::Sequence;
use pretty_assertions::assert_eq;
use tagsim_core::common::{ProtocolViolation, TagError, TraceRecord};
use tagsim_core::config::Config;
use tagsim_core::sim::{NullSink, ReplayError, Replayer, ThreadReplay, TraceReader};
use tagsim_core::tags::{LineRequest, LineRequestKind, UpdateOutcome};

use crate::common::builder::trace::TraceBuilder;
use crate::common::harness::init_tracing;
use crate::common::mocks::sink::MockSink;

fn config(line_bytes: u64) -> Config {
    let mut config = Config::default();
    config.replay.line_bytes = line_bytes;
    config
}

fn run(trace: TraceBuilder, config: Config) -> (Replayer, Vec<(u32, LineRequest)>) {
    init_tracing();
    let mut replayer = Replayer::new(config).unwrap();
    let mut fills: Vec<(u32, LineRequest)> = Vec::new();
    replayer
        .run(trace.entries().into_iter().map(Ok), &mut fills)
        .unwrap();
    (replayer, fills)
}

// ══════════════════════════════════════════════════════════
// 1. Fill emission
// ══════════════════════════════════════════════════════════

/// The fill for an access describes the line before the access is applied.
#[test]
fn fill_precedes_update() {
    let trace = TraceBuilder::new()
        .cap_write(0x1000, 16, true)
        .cap_read(0x1000, 16, false);
    let (replayer, fills) = run(trace, config(64));

    assert_eq!(fills.len(), 2);
    assert_eq!(fills[0].1.tags_known, 0, "first fill sees an empty table");
    assert_eq!(fills[1].1.tags_known, 1);
    assert_eq!(fills[1].1.tags, 1, "second fill sees the first write");
    assert_eq!(replayer.thread(0).unwrap().table().tag_at(0x1000), Some(false));
}

/// An access crossing a line boundary yields one fill per line.
#[test]
fn straddling_access_is_split_per_line() {
    let trace = TraceBuilder::new().cap_write(0x1000, 16, true).read(0x1038, 16);
    let (_, fills) = run(trace, config(64));

    let lines: Vec<u64> = fills.iter().map(|(_, r)| r.addr).collect();
    assert_eq!(lines, vec![0x1000, 0x1000, 0x1040]);
    assert_eq!(
        fills[1].1,
        LineRequest {
            kind: LineRequestKind::Fill,
            size: 64,
            addr: 0x1000,
            tags: 1,
            tags_known: 1,
        }
    );
}

/// Markers and other records produce no fills.
#[test]
fn non_access_records_produce_no_fills() {
    let trace = TraceBuilder::new().claim(1).other_marker(3).record(TraceRecord::Other);
    let (_, fills) = run(trace, config(64));
    assert!(fills.is_empty());
}

#[test]
fn fills_can_be_disabled() {
    let mut config = config(64);
    config.replay.emit_fill_requests = false;
    let (replayer, fills) = run(TraceBuilder::new().fetch(0x4000, 4), config);
    assert!(fills.is_empty());
    assert_eq!(replayer.stats().fill_requests, 0);
    assert_eq!(replayer.known_granules(), 1);
}

/// The sink sees each fill exactly once, in order, tagged with its thread.
#[test]
fn sink_receives_thread_and_request() {
    let mut sink = MockSink::new();
    let mut seq = Sequence::new();
    sink.expect_on_fill()
        .withf(|thread, request| *thread == 3 && request.addr == 0x4000 && request.tags_known == 0)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    sink.expect_on_fill()
        .withf(|thread, request| *thread == 3 && request.addr == 0x4000 && request.tags_known == 1)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    let mut replay = ThreadReplay::new(3, &config(32)).unwrap();
    for record in TraceBuilder::new().fetch(0x4000, 4).fetch(0x4004, 4).records() {
        replay.step(&record, &mut sink).unwrap();
    }
    assert_eq!(replay.thread(), 3);
}

// ══════════════════════════════════════════════════════════
// 2. Thread isolation
// ══════════════════════════════════════════════════════════

/// A claim on one thread is never consumed by another thread's access.
#[test]
fn threads_have_independent_tables_and_claims() {
    let trace = TraceBuilder::new()
        .thread(0)
        .claim(1)
        .thread(1)
        .read(0x1000, 16)
        .thread(0)
        .read(0x2000, 16);
    let (replayer, _) = run(trace, config(64));

    let t0 = replayer.thread(0).unwrap();
    let t1 = replayer.thread(1).unwrap();
    assert_eq!(t0.table().tag_at(0x2000), Some(true));
    assert_eq!(t0.table().tag_at(0x1000), None);
    assert!(t1.table().is_empty());
    assert_eq!(t1.stats().skipped_non_capability, 1);
    assert_eq!(replayer.threads().map(ThreadReplay::thread).collect::<Vec<_>>(), vec![0, 1]);
}

// ══════════════════════════════════════════════════════════
// 3. Fatal violations
// ══════════════════════════════════════════════════════════

#[test]
fn violation_reports_thread_and_index() {
    let entries = TraceBuilder::new()
        .thread(4)
        .cap_read(0x1000, 16, true)
        .write(0x1000, 16)
        .fetch(0x2000, 4)
        .entries();
    let mut replayer = Replayer::new(Config::default()).unwrap();
    let err = replayer
        .run(entries.into_iter().map(Ok), &mut NullSink)
        .unwrap_err();

    match err {
        ReplayError::Tag {
            thread,
            index,
            source,
        } => {
            assert_eq!(thread, 4);
            assert_eq!(index, 2);
            assert_eq!(
                source,
                TagError::Protocol(ProtocolViolation::UnclaimedWrite { addr: 0x1000 })
            );
        }
        other => panic!("expected tag error, got {other:?}"),
    }
    let t4 = replayer.thread(4).unwrap();
    assert!(t4.is_aborted());
    assert_eq!(t4.table().tag_at(0x2000), None, "records after the violation are not replayed");
}

/// Once aborted, a thread refuses further records.
#[test]
fn aborted_thread_rejects_further_records() {
    let mut replay = ThreadReplay::new(0, &Config::default()).unwrap();
    replay.step(&TraceRecord::tag_marker(0), &mut NullSink).unwrap();
    assert!(replay.step(&TraceRecord::tag_marker(1), &mut NullSink).is_err());

    let err = replay
        .step(&TraceRecord::InstructionFetch { addr: 0, size: 4 }, &mut NullSink)
        .unwrap_err();
    assert!(matches!(err, ReplayError::ThreadAborted { thread: 0 }));
    assert!(replay.table().is_empty());
}

/// A rejected access sends nothing to the cache model and counts no fills.
#[test]
fn rejected_access_emits_no_fills() {
    let mut sink = MockSink::new();
    sink.expect_on_fill().times(0);

    let mut replayer = Replayer::new(Config::default()).unwrap();
    let entry = TraceBuilder::new().write(0x1000, 8).entries().remove(0);
    let err = replayer.step(&entry, &mut sink).unwrap_err();
    assert!(matches!(
        err,
        ReplayError::Tag {
            source: TagError::Protocol(ProtocolViolation::UnclaimedWrite { addr: 0x1000 }),
            ..
        }
    ));

    let stats = replayer.stats();
    assert_eq!(stats.fill_requests, 0);
    assert_eq!(stats.records, 0);
}

/// A violation midway through a stream leaves fills and records in step.
#[test]
fn fills_stop_at_the_violating_record() {
    let entries = TraceBuilder::new()
        .cap_write(0x1000, 16, true)
        .claim(1)
        .prefetch(0x2000, 16)
        .entries();
    let mut replayer = Replayer::new(Config::default()).unwrap();
    let mut fills: Vec<(u32, LineRequest)> = Vec::new();
    assert!(replayer.run(entries.into_iter().map(Ok), &mut fills).is_err());

    assert_eq!(fills.len(), 1);
    assert_eq!(fills[0].1.addr, 0x1000);
    assert_eq!(replayer.stats().fill_requests, 1);
    assert_eq!(replayer.stats().records, 3);
}

#[test]
fn parse_errors_stop_the_run() {
    let text = "{\"type\":\"instruction_fetch\",\"addr\":0,\"size\":4}\nnot json\n{\"type\":\"instruction_fetch\",\"addr\":64,\"size\":4}\n";
    let mut replayer = Replayer::new(Config::default()).unwrap();
    let err = replayer
        .run(TraceReader::new(text.as_bytes()), &mut NullSink)
        .unwrap_err();
    assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    assert_eq!(replayer.known_granules(), 1);
}

#[test]
fn invalid_line_size_is_rejected_up_front() {
    assert!(matches!(Replayer::new(config(48)), Err(ReplayError::Config(_))));
    assert!(matches!(ThreadReplay::new(0, &config(512)), Err(ReplayError::Config(_))));
}

// ══════════════════════════════════════════════════════════
// 4. Statistics
// ══════════════════════════════════════════════════════════

#[test]
fn stats_are_aggregated_across_threads() {
    let trace = TraceBuilder::new()
        .thread(0)
        .cap_write(0x1000, 32, true)
        .read(0x1000, 8)
        .thread(1)
        .fetch(0x4000, 4)
        .other_marker(0);
    let (replayer, fills) = run(trace, config(64));
    let stats = replayer.stats();

    assert_eq!(stats.records, 5);
    assert_eq!(stats.claims, 1);
    assert_eq!(stats.tagged_writes, 1);
    assert_eq!(stats.untagged_writes, 1);
    assert_eq!(stats.skipped_non_capability, 1);
    assert_eq!(stats.ignored, 1);
    assert_eq!(stats.granules_written, 3);
    assert_eq!(stats.fill_requests, fills.len() as u64);
    assert_eq!(stats.fill_requests, 3);
    assert_eq!(replayer.known_granules(), 3);
}

#[test]
fn step_returns_update_outcome() {
    let mut replay = ThreadReplay::new(0, &Config::default()).unwrap();
    assert_eq!(
        replay.step(&TraceRecord::tag_marker(1), &mut NullSink).unwrap(),
        UpdateOutcome::Claimed(true)
    );
}
