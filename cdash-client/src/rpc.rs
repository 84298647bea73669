//! # JSON-RPC Framing
//!
//! Purpose: Encode the counter request body and decode the response body
//! without touching the network, so the rules are unit-testable.

use cdash_common::{RpcOutcomeError, RpcRequest, RpcResponse};

use crate::client::{ClientError, ClientResult};

/// Encodes a parameterless call into a request body.
pub fn encode_call(id: u64, method: &str) -> ClientResult<Vec<u8>> {
    serde_json::to_vec(&RpcRequest::call(id, method)).map_err(|err| ClientError::Protocol(err.to_string()))
}

/// Decodes a response body into the counter value.
pub fn decode_counter(body: &[u8]) -> ClientResult<u64> {
    let response: RpcResponse =
        serde_json::from_slice(body).map_err(|err| ClientError::Protocol(err.to_string()))?;
    response.into_result().map_err(|err| match err {
        RpcOutcomeError::Remote { code, message } => ClientError::Remote { code, message },
        RpcOutcomeError::MissingResult => ClientError::Protocol("response has no result".to_string()),
        RpcOutcomeError::BadQuantity(raw) => ClientError::Protocol(format!("bad quantity {}", raw)),
    })
}
