//! # RPC Sampler
//!
//! One remote call per endpoint, returning the counter or a reason it could
//! not be read. No retries and no state; cadence belongs to the accumulator.

use async_trait::async_trait;
use thiserror::Error;

use cdash_client::{ClientError, RpcClient};
use cdash_common::Endpoint;

/// Why one endpoint could not be sampled.
#[derive(Debug, Error)]
pub enum SampleError {
    /// The RPC client failed (transport, timeout, protocol or remote error).
    #[error(transparent)]
    Client(#[from] ClientError),
    /// A scripted call was told to fail.
    #[cfg(any(test, feature = "testing"))]
    #[error("endpoint unavailable: {0}")]
    Unavailable(String),
}

/// Reads the counter from one endpoint.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Performs a single call against `endpoint`.
    async fn sample(&self, endpoint: &Endpoint) -> Result<u64, SampleError>;
}

/// Production sampler backed by the JSON-RPC client.
pub struct RpcSampler {
    client: RpcClient,
}

impl RpcSampler {
    /// Wraps a configured client.
    pub fn new(client: RpcClient) -> Self {
        RpcSampler { client }
    }
}

#[async_trait]
impl Sampler for RpcSampler {
    async fn sample(&self, endpoint: &Endpoint) -> Result<u64, SampleError> {
        Ok(self.client.counter(endpoint).await?)
    }
}
