//! # Record Type Definitions
//!
//! Core data types for the daily-average records and the endpoint list.
//!
//! ## Design Principles
//!
//! 1. **Literal Calendar Keys**: A day is keyed as `YEAR-MONTH-DAY` without
//!    zero padding (`2024-3-9`), matching the records the dashboard has always
//!    written.
//!
//! 2. **Fixed-Width Values**: Averages are stored as exactly 8 big-endian bytes,
//!    so a record is either a valid `u64` or detectably corrupt.
//!
//! 3. **Validated Endpoints**: Addresses are checked once at startup and
//!    tagged with their transport; the sampling loop never sees a malformed URL.
//!
//! ## Memory Layout Example
//!
//! ```text
//! Record for 2024-3-9 with mean 37:
//! +------------------+-------------------------------------------+
//! | key: "2024-3-9"  | value: 00 00 00 00 00 00 00 25            |
//! +------------------+-------------------------------------------+
//! ```

use std::fmt;
use std::str::FromStr;

use bytes::{Buf, BufMut};
use chrono::{Datelike, NaiveDate};

use crate::error::{CdashError, CdashResult};

/// Encoded size of a daily average record value.
pub const RECORD_VALUE_LEN: usize = 8;

/// Calendar day key for a daily average record.
///
/// Wraps the validated date; the string form is produced on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Creates a key from a calendar date.
    pub fn new(date: NaiveDate) -> Self {
        DayKey(date)
    }

    /// Creates a key from calendar numbers, rejecting impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> CdashResult<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(DayKey)
            .ok_or_else(|| CdashError::InvalidDayKey(format!("{}-{}-{}", year, month, day)))
    }

    /// Returns the underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Returns the store key bytes (`YEAR-MONTH-DAY`, unpadded).
    pub fn to_key_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl FromStr for DayKey {
    type Err = CdashError;

    /// Parses `YEAR-MONTH-DAY`. Zero-padded parts are accepted and normalized,
    /// so `2024-03-09` and `2024-3-9` address the same record.
    fn from_str(raw: &str) -> CdashResult<Self> {
        let invalid = || CdashError::InvalidDayKey(raw.to_string());
        let mut parts = raw.splitn(3, '-');
        let year = parts.next().ok_or_else(invalid)?;
        let month = parts.next().ok_or_else(invalid)?;
        let day = parts.next().ok_or_else(invalid)?;

        let all_digits = [year, month, day]
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));
        if !all_digits {
            return Err(invalid());
        }

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        NaiveDate::from_ymd_opt(year, month, day)
            .map(DayKey)
            .ok_or_else(invalid)
    }
}

/// Encodes a daily average as 8 big-endian bytes.
pub fn encode_average(average: u64) -> [u8; RECORD_VALUE_LEN] {
    let mut buf = [0u8; RECORD_VALUE_LEN];
    let mut cursor = &mut buf[..];
    cursor.put_u64(average);
    buf
}

/// Decodes a stored record value.
///
/// # Errors
/// Returns `CdashError::CorruptRecord` unless `raw` is exactly 8 bytes.
pub fn decode_average(raw: &[u8]) -> CdashResult<u64> {
    if raw.len() != RECORD_VALUE_LEN {
        return Err(CdashError::CorruptRecord(raw.len()));
    }
    let mut cursor = raw;
    Ok(cursor.get_u64())
}

/// Wire transport an endpoint is reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// JSON-RPC over HTTP POST (`http://`, `https://`).
    Http,
    /// JSON-RPC over a WebSocket text frame (`ws://`, `wss://`).
    WebSocket,
}

const SCHEMES: [(&str, Transport); 4] = [
    ("http://", Transport::Http),
    ("https://", Transport::Http),
    ("ws://", Transport::WebSocket),
    ("wss://", Transport::WebSocket),
];

/// A polled RPC endpoint.
///
/// Accepts `http`, `https`, `ws` and `wss` addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    url: String,
    transport: Transport,
}

impl Endpoint {
    /// Validates and wraps an endpoint address.
    ///
    /// # Errors
    /// Returns `CdashError::InvalidEndpoint` for empty hosts or other schemes.
    pub fn parse(raw: &str) -> CdashResult<Self> {
        let trimmed = raw.trim();
        let (rest, transport) = SCHEMES
            .iter()
            .find_map(|(prefix, transport)| {
                trimmed.strip_prefix(prefix).map(|rest| (rest, *transport))
            })
            .ok_or_else(|| CdashError::InvalidEndpoint(raw.to_string()))?;
        let host = rest.split('/').next().unwrap_or_default();
        if host.is_empty() {
            return Err(CdashError::InvalidEndpoint(raw.to_string()));
        }
        Ok(Endpoint {
            url: trimmed.to_string(),
            transport,
        })
    }

    /// Returns the endpoint URL.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns the transport selected by the URL scheme.
    #[inline]
    pub fn transport(&self) -> Transport {
        self.transport
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl FromStr for Endpoint {
    type Err = CdashError;

    fn from_str(raw: &str) -> CdashResult<Self> {
        Endpoint::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_key_is_unpadded() {
        let key = DayKey::from_ymd(2024, 3, 9).unwrap();
        assert_eq!(key.to_string(), "2024-3-9");
        assert_eq!(key.to_key_bytes(), b"2024-3-9".to_vec());
    }

    #[test]
    fn day_key_parse_normalizes_padding() {
        let padded: DayKey = "2024-03-09".parse().unwrap();
        let plain: DayKey = "2024-3-9".parse().unwrap();
        assert_eq!(padded, plain);
        assert_eq!(padded.to_string(), "2024-3-9");
    }

    #[test]
    fn day_key_rejects_garbage() {
        assert!("2024-2-30".parse::<DayKey>().is_err());
        assert!("2024-3".parse::<DayKey>().is_err());
        assert!("2024-+3-9".parse::<DayKey>().is_err());
        assert!("today".parse::<DayKey>().is_err());
    }

    #[test]
    fn average_is_big_endian() {
        assert_eq!(encode_average(37), [0, 0, 0, 0, 0, 0, 0, 37]);
        assert_eq!(encode_average(0x0102), [0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(decode_average(&[0, 0, 0, 0, 0, 0, 1, 2]).unwrap(), 0x0102);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        assert_eq!(decode_average(&[1, 2, 3]), Err(CdashError::CorruptRecord(3)));
        assert_eq!(decode_average(&[]), Err(CdashError::CorruptRecord(0)));
    }

    #[test]
    fn endpoint_scheme_selects_transport() {
        let http = Endpoint::parse("http://seed1.example.org:8546").unwrap();
        assert_eq!(http.transport(), Transport::Http);
        let https = Endpoint::parse("https://rpc.example.org/v1").unwrap();
        assert_eq!(https.transport(), Transport::Http);
        let ws = Endpoint::parse("ws://seed4.example.org:7778").unwrap();
        assert_eq!(ws.transport(), Transport::WebSocket);
        assert_eq!(ws.as_str(), "ws://seed4.example.org:7778");
        let wss = Endpoint::parse(" wss://seed5.example.org/rpc ").unwrap();
        assert_eq!(wss.transport(), Transport::WebSocket);
        assert_eq!(wss.as_str(), "wss://seed5.example.org/rpc");
    }

    #[test]
    fn endpoint_rejects_bad_addresses() {
        assert!(Endpoint::parse("http://").is_err());
        assert!(Endpoint::parse("ws:///rpc").is_err());
        assert!(Endpoint::parse("ftp://seed1.example.org").is_err());
        assert!(Endpoint::parse("seed1.example.org").is_err());
    }
}
