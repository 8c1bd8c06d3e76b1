//! Error types for the head tracking library.
//!
//! Per-frame tracking anomalies (no new frame, no blob, invalid samples) are
//! not errors; they are reported as [`crate::tracker::TickOutcome`] values.
//! This enum covers failures at the edges: configuration, I/O and invalid
//! construction parameters.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Depth source produced data that does not match its declared geometry
    #[error("Depth source error: {0}")]
    DepthSource(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
