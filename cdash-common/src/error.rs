//! # Error Types
//!
//! Shared error vocabulary for the store, the record codec and configuration
//! parsing. Callers match on variants, so keep them small and comparable.

use thiserror::Error;

/// Result alias used across the dashboard crates.
pub type CdashResult<T> = Result<T, CdashError>;

/// Errors surfaced by shared types and the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CdashError {
    /// A day key did not match `YEAR-MONTH-DAY` or named an impossible date.
    #[error("invalid day key: {0}")]
    InvalidDayKey(String),

    /// A stored record was not exactly 8 bytes long.
    #[error("corrupt record: expected 8 bytes, found {0}")]
    CorruptRecord(usize),

    /// Endpoint address is malformed or uses an unsupported scheme.
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    /// The backing store failed to read, write or flush.
    #[error("storage error: {0}")]
    Storage(String),
}

impl CdashError {
    /// Returns true for errors caused by bytes already on disk.
    pub fn is_corruption(&self) -> bool {
        matches!(self, CdashError::CorruptRecord(_))
    }
}
