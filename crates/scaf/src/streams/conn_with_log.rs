// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::{debug, enabled, trace, Level};

use super::connection::Connection;
use super::StreamError;

/// Decorator reporting send/receive sizes at debug level and content
/// checksums at trace level. Semantics of the wrapped connection are
/// untouched.
pub struct ConnectionWithLog {
    inner: Arc<dyn Connection>,
}

impl ConnectionWithLog {
    pub fn new(inner: Arc<dyn Connection>) -> Self {
        Self { inner }
    }
}

fn sha256_hex(data: &[u8]) -> String {
    Sha256::digest(data).iter().map(|b| format!("{b:02x}")).collect()
}

#[tonic::async_trait]
impl Connection for ConnectionWithLog {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, data: Bytes) -> Result<(), StreamError> {
        let size = data.len();
        let checksum = enabled!(Level::TRACE).then(|| sha256_hex(&data));
        let result = self.inner.send(data).await;
        match (&result, checksum) {
            (Ok(()), Some(sum)) => {
                trace!(conn = %self.inner.name(), size, checksum = %sum, "sent data");
            }
            (Ok(()), None) => debug!(conn = %self.inner.name(), size, "sent data"),
            (Err(err), _) => debug!(conn = %self.inner.name(), size, "send data error: {err}"),
        }
        result
    }

    async fn receive(&self) -> Result<Bytes, StreamError> {
        let result = self.inner.receive().await;
        match &result {
            Ok(data) if enabled!(Level::TRACE) => {
                let sum = sha256_hex(data);
                trace!(conn = %self.inner.name(), size = data.len(), checksum = %sum, "received data");
            }
            Ok(data) => debug!(conn = %self.inner.name(), size = data.len(), "received data"),
            Err(err) => debug!(conn = %self.inner.name(), "receive error: {err}"),
        }
        result
    }

    async fn close(&self) -> Result<(), StreamError> {
        let result = self.inner.close().await;
        match &result {
            Ok(()) => debug!(conn = %self.inner.name(), "connection closed"),
            Err(err) => debug!(conn = %self.inner.name(), "close error: {err}"),
        }
        result
    }
}
