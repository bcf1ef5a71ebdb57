//! Configuration system for the tag-tracking replay.
//!
//! This module defines the configuration structures used to parameterize a
//! replay. It provides:
//! 1. **Defaults:** Baseline line size and output switches.
//! 2. **Structures:** General and replay settings.
//! 3. **Validation:** Rejection of line sizes the fill request masks cannot hold.
//!
//! Configuration is supplied as JSON (`Config::from_json`) or built with `Config::default()`.

use serde::Deserialize;

use crate::common::PreconditionViolation;
use crate::common::constants::DEFAULT_LINE_BYTES;
use crate::tags::validate_block_size;

/// Default configuration constants for the replay.
mod defaults {
    /// Fill requests are emitted unless explicitly disabled.
    pub const EMIT_FILL_REQUESTS: bool = true;
}

/// Root configuration.
///
/// Every field may be omitted from the JSON input and takes its default.
///
/// # Example
///
/// ```
/// use tagsim_core::config::Config;
///
/// let json = r#"{
///     "general": { "trace_records": true },
///     "replay": { "line_bytes": 128 }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// assert!(config.general.trace_records);
/// assert_eq!(config.replay.line_bytes, 128);
/// assert!(config.replay.emit_fill_requests);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// General replay settings
    #[serde(default)]
    pub general: GeneralConfig,
    /// Line request settings
    #[serde(default)]
    pub replay: ReplayConfig,
}

impl Config {
    /// Parses a configuration from JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the input is not a valid configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Checks that the configured values are usable.
    ///
    /// # Errors
    ///
    /// Returns a [`PreconditionViolation`] if `replay.line_bytes` is not a valid
    /// fill request block size.
    pub const fn validate(&self) -> Result<(), PreconditionViolation> {
        validate_block_size(self.replay.line_bytes)
    }
}

/// General replay settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneralConfig {
    /// Log every replayed record at debug level.
    #[serde(default)]
    pub trace_records: bool,
}

/// Line request settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    /// Cache line size in bytes used for fill requests.
    #[serde(default = "ReplayConfig::default_line_bytes")]
    pub line_bytes: u64,

    /// Build a fill request for every line an access touches.
    #[serde(default = "ReplayConfig::default_emit_fill_requests")]
    pub emit_fill_requests: bool,
}

impl ReplayConfig {
    /// Returns the default line size.
    const fn default_line_bytes() -> u64 {
        DEFAULT_LINE_BYTES
    }

    /// Returns the default fill request switch.
    const fn default_emit_fill_requests() -> bool {
        defaults::EMIT_FILL_REQUESTS
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            line_bytes: DEFAULT_LINE_BYTES,
            emit_fill_requests: defaults::EMIT_FILL_REQUESTS,
        }
    }
}
