//! # cdash RPC Client
//!
//! Purpose: Poll a single counter from a JSON-RPC endpoint (HTTP or
//! WebSocket) with a bounded call time.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `RpcClient` hides transport and envelope details.
//! 2. **One Call, One Answer**: No retries here; cadence is the caller's job.
//! 3. **Fail Fast**: Malformed responses surface immediately as errors.
//! 4. **Bounded Latency**: Every call carries an explicit timeout.

mod client;
mod rpc;
mod ws;

pub use client::{ClientConfig, ClientError, ClientResult, RpcClient};
