//! Replay statistics collection and reporting.
//!
//! This module tracks what the tag tracker saw during a replay. It provides:
//! 1. **Record mix:** Claims, tag-0 and tag-1 writes, skipped and ignored records.
//! 2. **Table growth:** Granule tag writes.
//! 3. **Line requests:** Fill requests handed to the cache model.

use std::time::Instant;

use crate::tags::UpdateOutcome;

/// Replay statistics for one or more simulated threads.
#[derive(Clone, Debug)]
pub struct TagStats {
    start_time: Instant,
    /// Total records replayed.
    pub records: u64,
    /// Capability-tag markers claimed.
    pub claims: u64,
    /// Accesses that wrote tag 0.
    pub untagged_writes: u64,
    /// Accesses that wrote tag 1.
    pub tagged_writes: u64,
    /// Loads and prefetches with no pending claim (tags unknown).
    pub skipped_non_capability: u64,
    /// Records irrelevant to tag tracking.
    pub ignored: u64,
    /// Granule tag writes (a granule written twice counts twice).
    pub granules_written: u64,
    /// Fill requests built.
    pub fill_requests: u64,
    /// Fill requests whose line had every granule tag known.
    pub fully_known_fills: u64,
}

impl Default for TagStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            records: 0,
            claims: 0,
            untagged_writes: 0,
            tagged_writes: 0,
            skipped_non_capability: 0,
            ignored: 0,
            granules_written: 0,
            fill_requests: 0,
            fully_known_fills: 0,
        }
    }
}

impl TagStats {
    /// Counts one successfully applied record.
    pub const fn record(&mut self, outcome: &UpdateOutcome) {
        self.records += 1;
        match *outcome {
            UpdateOutcome::Claimed(_) => self.claims += 1,
            UpdateOutcome::Tagged { tag, granules } => {
                if tag {
                    self.tagged_writes += 1;
                } else {
                    self.untagged_writes += 1;
                }
                self.granules_written += granules;
            }
            UpdateOutcome::SkippedNonCapability => self.skipped_non_capability += 1,
            UpdateOutcome::Ignored => self.ignored += 1,
        }
    }

    /// Counts one fill request.
    pub const fn record_fill(&mut self, fully_known: bool) {
        self.fill_requests += 1;
        if fully_known {
            self.fully_known_fills += 1;
        }
    }

    /// Adds another thread's counters into this one.
    ///
    /// The earlier of the two start times is kept.
    pub fn merge(&mut self, other: &Self) {
        self.start_time = self.start_time.min(other.start_time);
        self.records += other.records;
        self.claims += other.claims;
        self.untagged_writes += other.untagged_writes;
        self.tagged_writes += other.tagged_writes;
        self.skipped_non_capability += other.skipped_non_capability;
        self.ignored += other.ignored;
        self.granules_written += other.granules_written;
        self.fill_requests += other.fill_requests;
        self.fully_known_fills += other.fully_known_fills;
    }

    /// Prints the statistics report to stdout.
    ///
    /// # Arguments
    ///
    /// * `known_granules` - Distinct granules with a known tag at the end of the replay.
    pub fn print(&self, known_granules: usize) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let fills = self.fill_requests.max(1);
        let krps = if seconds > 0.0 {
            (self.records as f64 / seconds) / 1000.0
        } else {
            0.0
        };

        println!("\n==========================================================");
        println!("CAPABILITY TAG REPLAY STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {seconds:.4} s");
        println!("records                  {}", self.records);
        println!("records_rate             {krps:.2} k/s");
        println!("----------------------------------------------------------");
        println!("RECORD MIX");
        println!("  claims                 {}", self.claims);
        println!("  writes.tag0            {}", self.untagged_writes);
        println!("  writes.tag1            {}", self.tagged_writes);
        println!("  skipped.non_capability {}", self.skipped_non_capability);
        println!("  ignored                {}", self.ignored);
        println!("----------------------------------------------------------");
        println!("TAG TABLE");
        println!("  granules.written       {}", self.granules_written);
        println!("  granules.known         {known_granules}");
        println!("----------------------------------------------------------");
        println!("LINE REQUESTS");
        println!("  fills                  {}", self.fill_requests);
        println!(
            "  fills.fully_known      {} ({:.2}%)",
            self.fully_known_fills,
            (self.fully_known_fills as f64 / fills as f64) * 100.0
        );
        println!("==========================================================");
    }
}
