//! Construction-time failures
//!
//! The simulation itself never fails: out-of-bounds pixels, negative masses
//! and double despawns are absorbed as policy. Only building a map or
//! loading settings can be rejected.

use thiserror::Error;

/// Errors raised while constructing simulation state
#[derive(Debug, Error)]
pub enum SimError {
    /// Map dimensions must both be non-zero
    #[error("invalid map dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    /// A zero flush budget would never drain the write queue
    #[error("flush budget must be at least 1")]
    InvalidFlushBudget,
    /// Settings file was not valid JSON for [`crate::Settings`]
    #[error("malformed settings: {0}")]
    Settings(#[from] serde_json::Error),
    /// Settings file could not be read
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
}
