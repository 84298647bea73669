//! # Store Trait
//!
//! Byte-level contract shared by every backend, plus the daily-record helpers
//! built on top of it.

use cdash_common::{decode_average, encode_average, CdashResult, DayKey};

/// One decoded daily-average record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRecord {
    /// Store key as written (`YEAR-MONTH-DAY`).
    pub day: String,
    /// Decoded mean, or `None` when the stored bytes are corrupt.
    pub average: Option<u64>,
}

/// Ordered byte-string key/value store.
///
/// Implementations must be safe to share between the accumulator task and the
/// HTTP handlers.
pub trait KVStore: Send + Sync {
    /// Looks up a key. Returns `Ok(None)` when absent.
    fn get(&self, key: &[u8]) -> CdashResult<Option<Vec<u8>>>;

    /// Inserts or overwrites a key.
    fn put(&self, key: &[u8], value: &[u8]) -> CdashResult<()>;

    /// Returns every entry in ascending key order.
    fn scan(&self) -> CdashResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// Forces buffered writes to durable storage.
    fn flush(&self) -> CdashResult<()>;

    /// Writes the mean for `day`, replacing any earlier value.
    fn put_day_average(&self, day: &DayKey, average: u64) -> CdashResult<()> {
        self.put(&day.to_key_bytes(), &encode_average(average))
    }

    /// Reads the mean stored under `day`.
    ///
    /// **Output**: `Ok(Some(mean))` when present, `Ok(None)` when absent, and
    /// `Err(CorruptRecord)` when the value is not 8 bytes.
    fn day_average(&self, day: &DayKey) -> CdashResult<Option<u64>> {
        match self.get(&day.to_key_bytes())? {
            Some(raw) => decode_average(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Lists all daily records in store order.
    fn day_records(&self) -> CdashResult<Vec<DayRecord>> {
        let entries = self.scan()?;
        Ok(entries
            .into_iter()
            .map(|(key, value)| DayRecord {
                day: String::from_utf8_lossy(&key).into_owned(),
                average: decode_average(&value).ok(),
            })
            .collect())
    }
}
