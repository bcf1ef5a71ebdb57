//! Trace replay.
//!
//! Reads captured record streams and drives one tag table per simulated
//! thread, handing fill requests to a downstream cache model.

use thiserror::Error;

use crate::common::{PreconditionViolation, TagError};

/// Per-thread replay driver and line request sink.
pub mod replay;

/// JSON-lines trace reader.
pub mod trace;

/// Error that ends a replay.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The trace could not be read.
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A trace line is not a valid record.
    #[error("trace line {line}: {source}")]
    Parse {
        /// 1-based line number.
        line: usize,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// A record broke the tag tracker's protocol or preconditions.
    #[error("thread {thread}, record {index}: {source}")]
    Tag {
        /// Simulated thread id.
        thread: u32,
        /// 0-based index of the offending record in that thread's stream.
        index: u64,
        /// The violation.
        source: TagError,
    },

    /// A record was offered to a thread whose replay already failed.
    #[error("thread {thread} replay was aborted by an earlier violation")]
    ThreadAborted {
        /// Simulated thread id.
        thread: u32,
    },

    /// The configuration cannot be used for replay.
    #[error("invalid configuration: {0}")]
    Config(#[from] PreconditionViolation),
}

pub use self::replay::{LineRequestSink, NullSink, Replayer, ThreadReplay};
pub use self::trace::{TraceEntry, TraceReader};
