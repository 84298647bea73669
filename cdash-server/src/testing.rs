//! # Scripted Collaborators
//!
//! Deterministic stand-ins for the network side of the loop, used by unit and
//! integration tests to drive rounds without real endpoints.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use cdash_common::Endpoint;

use crate::sampler::{SampleError, Sampler};

/// Sampler that replays a fixed script of answers.
///
/// The script is a list of rounds; each round lists one answer per endpoint
/// in query order. `None` is a failed call. Once the script runs out every
/// call fails.
#[derive(Debug, Default)]
pub struct ScriptedSampler {
    answers: Mutex<VecDeque<Option<u64>>>,
    calls: AtomicUsize,
}

impl ScriptedSampler {
    /// Builds a sampler from per-round answers.
    pub fn new(rounds: Vec<Vec<Option<u64>>>) -> Self {
        ScriptedSampler {
            answers: Mutex::new(rounds.into_iter().flatten().collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }

    /// Number of scripted answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.lock().expect("script mutex poisoned").len()
    }
}

#[async_trait]
impl Sampler for ScriptedSampler {
    async fn sample(&self, endpoint: &Endpoint) -> Result<u64, SampleError> {
        self.calls.fetch_add(1, Ordering::AcqRel);
        let next = self.answers.lock().expect("script mutex poisoned").pop_front();
        match next {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(SampleError::Unavailable(format!("{} refused the call", endpoint))),
            None => Err(SampleError::Unavailable("script exhausted".to_string())),
        }
    }
}
