//! # Latest-Value Cache
//!
//! Single-writer, many-reader holder for the most recent valid round sum.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared handle to the latest valid round sum.
///
/// Cloning shares the same cell. Only the accumulator calls `replace`.
#[derive(Debug, Clone, Default)]
pub struct LatestValue {
    inner: Arc<AtomicU64>,
}

impl LatestValue {
    /// Creates a holder starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the value with a new round sum.
    pub fn replace(&self, sum: u64) {
        self.inner.store(sum, Ordering::Release);
    }

    /// Returns the most recently published sum.
    pub fn get(&self) -> u64 {
        self.inner.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let writer = LatestValue::new();
        let reader = writer.clone();
        assert_eq!(reader.get(), 0);
        writer.replace(60);
        writer.replace(15);
        assert_eq!(reader.get(), 15);
    }
}
