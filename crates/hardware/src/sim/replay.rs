//! Replay driver: owns the per-thread tag tables side by side.
//!
//! Each simulated thread gets its own [`ThreadReplay`] with an independent tag
//! table; records of different threads never meet in one table. For every
//! access, the lines it touches are handed to a [`LineRequestSink`] as fill
//! requests built from the table as it stood before the access was applied,
//! once the access has been accepted.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use super::ReplayError;
use super::trace::TraceEntry;
use crate::common::{MemAccess, TagError, TraceRecord, aligned_span};
use crate::config::Config;
use crate::stats::TagStats;
use crate::tags::{LineRequest, TagTable, UpdateOutcome};

/// Consumer of fill requests (the downstream cache model).
pub trait LineRequestSink {
    /// Receives the fill request for one line touched by `thread`.
    fn on_fill(&mut self, thread: u32, request: &LineRequest);
}

/// Sink that discards every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LineRequestSink for NullSink {
    fn on_fill(&mut self, _thread: u32, _request: &LineRequest) {}
}

impl LineRequestSink for Vec<(u32, LineRequest)> {
    fn on_fill(&mut self, thread: u32, request: &LineRequest) {
        self.push((thread, *request));
    }
}

/// Replay state of one simulated thread.
#[derive(Debug)]
pub struct ThreadReplay {
    thread: u32,
    table: TagTable,
    stats: TagStats,
    line_bytes: u64,
    emit_fills: bool,
    trace_records: bool,
    aborted: bool,
}

impl ThreadReplay {
    /// Creates the replay state for `thread`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Config`] if the configured line size is invalid.
    pub fn new(thread: u32, config: &Config) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self::with_validated(thread, config))
    }

    fn with_validated(thread: u32, config: &Config) -> Self {
        Self {
            thread,
            table: TagTable::new(),
            stats: TagStats::default(),
            line_bytes: config.replay.line_bytes,
            emit_fills: config.replay.emit_fill_requests,
            trace_records: config.general.trace_records,
            aborted: false,
        }
    }

    /// Replays the next record of this thread.
    ///
    /// Fill requests reach `sink` only once the record has been accepted.
    /// Any violation is fatal: nothing is sent, the error is returned, and
    /// every later call fails with [`ReplayError::ThreadAborted`].
    ///
    /// # Arguments
    ///
    /// * `record` - The next record of this thread's stream.
    /// * `sink` - Receiver of the fill requests for the lines `record` touches.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Tag`] on a protocol or precondition violation.
    pub fn step(
        &mut self,
        record: &TraceRecord,
        sink: &mut dyn LineRequestSink,
    ) -> Result<UpdateOutcome, ReplayError> {
        if self.aborted {
            return Err(ReplayError::ThreadAborted {
                thread: self.thread,
            });
        }

        let index = self.stats.records;
        if self.trace_records {
            debug!(thread = self.thread, index, ?record, "replaying record");
        }

        let applied = self
            .line_fills(record)
            .and_then(|fills| self.table.update(record).map(|outcome| (outcome, fills)));
        match applied {
            Ok((outcome, fills)) => {
                self.stats.record(&outcome);
                for request in &fills {
                    self.stats.record_fill(request.is_fully_known());
                    sink.on_fill(self.thread, request);
                }
                Ok(outcome)
            }
            Err(source) => {
                self.aborted = true;
                warn!(thread = self.thread, index, %source, "replay aborted");
                Err(ReplayError::Tag {
                    thread: self.thread,
                    index,
                    source,
                })
            }
        }
    }

    /// Splits an access at line boundaries and builds one fill request per
    /// line from the table as it stands before the access is applied.
    fn line_fills(&self, record: &TraceRecord) -> Result<Vec<LineRequest>, TagError> {
        let mut fills = Vec::new();
        if !self.emit_fills {
            return Ok(fills);
        }
        let Some(access) = record.access() else {
            return Ok(fills);
        };
        if access.size == 0 {
            return Ok(fills);
        }

        let lines = aligned_span(access.addr, access.size, self.line_bytes)?;
        let end = access.addr + access.size;
        for base in lines.step_by(self.line_bytes as usize) {
            let lo = base.max(access.addr);
            let hi = (base + self.line_bytes).min(end);
            let piece = TraceRecord::from_access(MemAccess {
                kind: access.kind,
                addr: lo,
                size: hi - lo,
            });
            fills.push(self.table.build_fill_request(&piece, self.line_bytes)?);
        }
        Ok(fills)
    }

    /// Returns the simulated thread id.
    pub const fn thread(&self) -> u32 {
        self.thread
    }

    /// Returns this thread's tag table.
    pub const fn table(&self) -> &TagTable {
        &self.table
    }

    /// Returns this thread's statistics.
    pub const fn stats(&self) -> &TagStats {
        &self.stats
    }

    /// Returns `true` once a violation has ended this thread's replay.
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }
}

/// Routes trace entries to per-thread replays.
#[derive(Debug)]
pub struct Replayer {
    config: Config,
    threads: BTreeMap<u32, ThreadReplay>,
}

impl Replayer {
    /// Creates a replayer with no threads.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Config`] if the configured line size is invalid.
    pub fn new(config: Config) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self {
            config,
            threads: BTreeMap::new(),
        })
    }

    /// Replays one entry on its thread, creating the thread on first sight.
    ///
    /// # Errors
    ///
    /// See [`ThreadReplay::step`].
    pub fn step(
        &mut self,
        entry: &TraceEntry,
        sink: &mut dyn LineRequestSink,
    ) -> Result<UpdateOutcome, ReplayError> {
        let config = &self.config;
        self.threads
            .entry(entry.thread)
            .or_insert_with(|| ThreadReplay::with_validated(entry.thread, config))
            .step(&entry.record, sink)
    }

    /// Replays every entry in order, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first read, parse or tag error encountered.
    pub fn run<I>(&mut self, entries: I, sink: &mut dyn LineRequestSink) -> Result<(), ReplayError>
    where
        I: IntoIterator<Item = Result<TraceEntry, ReplayError>>,
    {
        for entry in entries {
            let _ = self.step(&entry?, sink)?;
        }
        Ok(())
    }

    /// Returns the replay state of `thread`, if it has produced any record.
    pub fn thread(&self, thread: u32) -> Option<&ThreadReplay> {
        self.threads.get(&thread)
    }

    /// Iterates over all threads in ascending id order.
    pub fn threads(&self) -> impl Iterator<Item = &ThreadReplay> {
        self.threads.values()
    }

    /// Returns the statistics of all threads combined.
    pub fn stats(&self) -> TagStats {
        let mut total = TagStats::default();
        for replay in self.threads.values() {
            total.merge(&replay.stats);
        }
        total
    }

    /// Returns the number of known granules summed over all threads.
    pub fn known_granules(&self) -> usize {
        self.threads.values().map(|replay| replay.table.len()).sum()
    }
}
