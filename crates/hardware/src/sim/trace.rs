//! Trace File Reader.
//!
//! This module turns a JSON-lines trace into a stream of per-thread records. It performs:
//! 1. **File opening:** Buffered reads from disk.
//! 2. **Line parsing:** One JSON object per line; blank lines and `#` comments are skipped.
//! 3. **Thread routing:** Each entry names the simulated thread it belongs to (default 0).

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use super::ReplayError;
use crate::common::TraceRecord;

/// One line of a trace file: a record and the thread that produced it.
///
/// ```
/// use tagsim_core::common::TraceRecord;
/// use tagsim_core::sim::trace::TraceEntry;
///
/// let entry: TraceEntry =
///     serde_json::from_str(r#"{"thread":3,"type":"data_read","addr":4096,"size":16}"#).unwrap();
/// assert_eq!(entry.thread, 3);
/// assert_eq!(entry.record, TraceRecord::DataRead { addr: 4096, size: 16 });
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TraceEntry {
    /// Simulated thread id.
    #[serde(default)]
    pub thread: u32,
    /// The decoded record.
    #[serde(flatten)]
    pub record: TraceRecord,
}

/// Iterator over the entries of a JSON-lines trace.
#[derive(Debug)]
pub struct TraceReader<R> {
    input: R,
    line: usize,
    buf: String,
}

impl TraceReader<BufReader<File>> {
    /// Opens a trace file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Io`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> TraceReader<R> {
    /// Wraps any buffered reader.
    pub const fn new(input: R) -> Self {
        Self {
            input,
            line: 0,
            buf: String::new(),
        }
    }

    /// Returns the 1-based number of the last line read.
    pub const fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceEntry, ReplayError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.input.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let text = self.buf.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            return Some(
                serde_json::from_str(text).map_err(|source| ReplayError::Parse {
                    line: self.line,
                    source,
                }),
            );
        }
    }
}
