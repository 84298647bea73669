//! # WebSocket Transport
//!
//! Purpose: Run one JSON-RPC exchange over a fresh WebSocket connection. The
//! request goes out as a single text frame; the first data frame back is the
//! reply.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::trace;

use cdash_common::Endpoint;

use crate::client::{ClientError, ClientResult};

/// Sends `body` to `endpoint` and returns the raw reply payload.
///
/// Ping/pong and other control frames are skipped while waiting. A close
/// frame or end of stream before any data frame is a protocol error.
pub(crate) async fn exchange(
    endpoint: &Endpoint,
    body: Vec<u8>,
    connect_timeout: Duration,
) -> ClientResult<Vec<u8>> {
    let text = String::from_utf8(body).map_err(|err| ClientError::Protocol(err.to_string()))?;
    let (mut socket, _) =
        match tokio::time::timeout(connect_timeout, connect_async(endpoint.as_str())).await {
            Ok(result) => result?,
            Err(_) => return Err(ClientError::Timeout(connect_timeout)),
        };

    socket.send(Message::Text(text)).await?;
    let reply = loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => break text.into_bytes(),
            Some(Ok(Message::Binary(data))) => break data,
            Some(Ok(Message::Close(_))) | None => {
                return Err(ClientError::Protocol("connection closed before reply".to_string()))
            }
            Some(Ok(_)) => continue,
            Some(Err(err)) => return Err(err.into()),
        }
    };

    if let Err(err) = socket.close(None).await {
        trace!(endpoint = %endpoint, error = %err, "websocket close");
    }
    Ok(reply)
}
