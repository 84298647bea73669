//! # JSON-RPC Envelope
//!
//! Purpose: Define the request/response shapes used to poll a counter from an
//! endpoint, and the decoding rules for the returned quantity.
//!
//! ## Usage Notes
//!
//! - Requests always carry an empty `params` array; the counter method takes
//!   no arguments.
//! - A result may be a JSON number or a `0x`-prefixed hex quantity string.
//!   Both decode to `u64`; anything else is a protocol error.
//!
//! ## Wire Example
//!
//! ```text
//! --> {"jsonrpc":"2.0","id":1,"method":"eth_lastSubmitCount","params":[]}
//! <-- {"jsonrpc":"2.0","id":1,"result":"0x3c"}
//! <-- {"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Default counter method polled on every endpoint.
pub const DEFAULT_COUNTER_METHOD: &str = "eth_lastSubmitCount";

/// Outgoing JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    /// Builds a parameterless call.
    pub fn call(id: u64, method: impl Into<String>) -> Self {
        RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params: Vec::new(),
        }
    }
}

/// Error object returned by the remote side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Incoming JSON-RPC response.
///
/// Exactly one of `result` or `error` is expected; `into_result` enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Why a response could not be turned into a counter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcOutcomeError {
    /// Remote side reported an error object.
    Remote { code: i64, message: String },
    /// Neither `result` nor `error` was present.
    MissingResult,
    /// `result` was present but not a u64 quantity.
    BadQuantity(String),
}

impl RpcResponse {
    /// Extracts the counter value, preferring the remote error when both are set.
    pub fn into_result(self) -> Result<u64, RpcOutcomeError> {
        if let Some(err) = self.error {
            return Err(RpcOutcomeError::Remote {
                code: err.code,
                message: err.message,
            });
        }
        match self.result {
            Some(value) => parse_quantity(&value),
            None => Err(RpcOutcomeError::MissingResult),
        }
    }
}

/// Decodes a JSON number or `0x` hex string into a `u64`.
pub fn parse_quantity(value: &Value) -> Result<u64, RpcOutcomeError> {
    match value {
        Value::Number(num) => num
            .as_u64()
            .ok_or_else(|| RpcOutcomeError::BadQuantity(num.to_string())),
        Value::String(text) => {
            let digits = text
                .strip_prefix("0x")
                .or_else(|| text.strip_prefix("0X"))
                .ok_or_else(|| RpcOutcomeError::BadQuantity(text.clone()))?;
            if digits.is_empty() {
                return Err(RpcOutcomeError::BadQuantity(text.clone()));
            }
            u64::from_str_radix(digits, 16).map_err(|_| RpcOutcomeError::BadQuantity(text.clone()))
        }
        other => Err(RpcOutcomeError::BadQuantity(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_with_empty_params() {
        let req = RpcRequest::call(7, DEFAULT_COUNTER_METHOD);
        let encoded = serde_json::to_value(&req).unwrap();
        assert_eq!(
            encoded,
            json!({"jsonrpc": "2.0", "id": 7, "method": "eth_lastSubmitCount", "params": []})
        );
    }

    #[test]
    fn parses_number_and_hex_results() {
        assert_eq!(parse_quantity(&json!(60)), Ok(60));
        assert_eq!(parse_quantity(&json!("0x3c")), Ok(60));
        assert_eq!(parse_quantity(&json!("0x0")), Ok(0));
    }

    #[test]
    fn rejects_non_quantities() {
        assert!(parse_quantity(&json!(-1)).is_err());
        assert!(parse_quantity(&json!(1.5)).is_err());
        assert!(parse_quantity(&json!("60")).is_err());
        assert!(parse_quantity(&json!("0x")).is_err());
        assert!(parse_quantity(&json!(null)).is_err());
    }

    #[test]
    fn remote_error_wins() {
        let resp: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32601, "message": "method not found"}
        }))
        .unwrap();
        assert_eq!(
            resp.into_result(),
            Err(RpcOutcomeError::Remote {
                code: -32601,
                message: "method not found".to_string()
            })
        );
    }

    #[test]
    fn missing_result_is_an_error() {
        let resp: RpcResponse = serde_json::from_value(json!({"jsonrpc": "2.0", "id": 1})).unwrap();
        assert_eq!(resp.into_result(), Err(RpcOutcomeError::MissingResult));
    }
}
