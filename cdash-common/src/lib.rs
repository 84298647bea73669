// cdash-common - Shared types and wire definitions for the counter dashboard
//
// This crate defines the daily record format and the JSON-RPC envelope used
// to poll endpoints.

pub mod error;
pub mod types;
pub mod protocol;

// Re-export for convenience
pub use error::*;
pub use types::*;
pub use protocol::*;
