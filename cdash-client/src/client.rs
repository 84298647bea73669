//! # Async Client API
//!
//! Purpose: Expose a compact async call for reading the counter from one
//! endpoint over JSON-RPC, on HTTP or WebSocket as the URL scheme says.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `RpcClient` hides the transports and the envelope.
//! 2. **Shared Transport**: One `reqwest::Client` is reused for every HTTP
//!    endpoint so connections are pooled across rounds. WebSocket endpoints get
//!    a fresh connection per call.
//! 3. **Explicit Deadline**: The whole call (connect, send, read reply) runs
//!    under one `tokio::time::timeout`, whatever the transport.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;
use tracing::trace;

use cdash_common::{Endpoint, Transport, DEFAULT_COUNTER_METHOD};

use crate::rpc::{decode_counter, encode_call};
use crate::ws;

/// Result type for the RPC client.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by the RPC client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection or transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// WebSocket handshake or frame failure.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    /// The call did not finish within the configured deadline.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    /// Endpoint answered with a non-success HTTP status.
    #[error("http status {0}")]
    Status(u16),
    /// Body was not a well-formed JSON-RPC counter response.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// Endpoint returned a JSON-RPC error object.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },
}

/// Configuration for the RPC client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// JSON-RPC method that returns the counter.
    pub method: String,
    /// Deadline for one whole call.
    pub call_timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            method: DEFAULT_COUNTER_METHOD.to_string(),
            call_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Async JSON-RPC client for counter polling.
pub struct RpcClient {
    http: reqwest::Client,
    config: ClientConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Creates a client with default configuration.
    pub fn new() -> ClientResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Creates a client with a custom configuration.
    pub fn with_config(config: ClientConfig) -> ClientResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.call_timeout)
            .build()?;
        Ok(RpcClient {
            http,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Reads the counter from `endpoint`.
    ///
    /// **Input**: a validated endpoint.
    /// **Output**: the counter value, or the first failure encountered.
    ///
    /// **Logic**:
    /// 1. Encode a fresh request id and body.
    /// 2. Send it over the endpoint's transport under the call deadline.
    /// 3. Decode the JSON-RPC envelope from the reply.
    pub async fn counter(&self, endpoint: &Endpoint) -> ClientResult<u64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = encode_call(id, &self.config.method)?;
        let deadline = self.config.call_timeout;

        let call = async {
            let reply = match endpoint.transport() {
                Transport::Http => self.post(endpoint, body).await?,
                Transport::WebSocket => {
                    ws::exchange(endpoint, body, self.config.connect_timeout).await?
                }
            };
            decode_counter(&reply)
        };

        let value = match tokio::time::timeout(deadline, call).await {
            Ok(result) => result?,
            Err(_) => return Err(ClientError::Timeout(deadline)),
        };
        trace!(endpoint = %endpoint, id, value, "counter read");
        Ok(value)
    }

    async fn post(&self, endpoint: &Endpoint, body: Vec<u8>) -> ClientResult<Vec<u8>> {
        let response = self
            .http
            .post(endpoint.as_str())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}
