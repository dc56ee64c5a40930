// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use bytes::Bytes;

use super::StreamError;

/// A framed bidirectional message channel, independent of transport.
///
/// Each `send`/`receive` moves one whole message; implementations preserve
/// message boundaries. `send` is safe to call concurrently with `receive`,
/// but not with another `send` — the stream core issues at most one send at
/// a time per slot. After local or remote close, every operation returns
/// [`StreamError::ConnectionClosed`].
#[tonic::async_trait]
pub trait Connection: Send + Sync {
    /// Identifier used in logs.
    fn name(&self) -> &str;

    /// Deliver one message to the peer.
    async fn send(&self, data: Bytes) -> Result<(), StreamError>;

    /// Block until the next message from the peer arrives.
    async fn receive(&self) -> Result<Bytes, StreamError>;

    /// Close the connection. Idempotent.
    async fn close(&self) -> Result<(), StreamError>;
}
