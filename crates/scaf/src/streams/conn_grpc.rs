// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gRPC-bidi [`Connection`] implementations. Each logical message is one
//! `Package { bytes content }` on the wire.

use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tonic::{Status, Streaming};

use crate::api::proto::stream::v1::Package;

use super::connection::Connection;
use super::StreamError;

/// Server half of a `ConnectStream` exchange.
///
/// Inbound messages come from the request stream; outbound messages feed the
/// mpsc channel backing the response stream. The `done` token fires on
/// explicit close — the RPC handler uses it to hold the response stream
/// open until then.
pub struct GrpcServerConnection {
    name: String,
    inbound: Mutex<Streaming<Package>>,
    outbound: mpsc::Sender<Result<Package, Status>>,
    closed: AtomicBool,
    done: CancellationToken,
}

impl GrpcServerConnection {
    pub fn new(
        name: impl Into<String>,
        inbound: Streaming<Package>,
        outbound: mpsc::Sender<Result<Package, Status>>,
    ) -> Self {
        Self {
            name: name.into(),
            inbound: Mutex::new(inbound),
            outbound,
            closed: AtomicBool::new(false),
            done: CancellationToken::new(),
        }
    }

    /// Token cancelled when [`Connection::close`] is called.
    pub fn done(&self) -> CancellationToken {
        self.done.clone()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.done.is_cancelled()
    }
}

#[tonic::async_trait]
impl Connection for GrpcServerConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, data: Bytes) -> Result<(), StreamError> {
        if self.is_closed() {
            return Err(StreamError::ConnectionClosed);
        }
        self.outbound.send(Ok(Package { content: data.to_vec() })).await.map_err(|_| {
            self.closed.store(true, Ordering::Release);
            StreamError::ConnectionClosed
        })
    }

    async fn receive(&self) -> Result<Bytes, StreamError> {
        if self.is_closed() {
            return Err(StreamError::ConnectionClosed);
        }
        let mut inbound = self.inbound.lock().await;
        let message = tokio::select! {
            _ = self.done.cancelled() => return Err(StreamError::ConnectionClosed),
            message = inbound.message() => message,
        };
        match message {
            Ok(Some(package)) => Ok(Bytes::from(package.content)),
            Ok(None) | Err(_) => {
                self.closed.store(true, Ordering::Release);
                Err(StreamError::ConnectionClosed)
            }
        }
    }

    async fn close(&self) -> Result<(), StreamError> {
        self.closed.store(true, Ordering::Release);
        self.done.cancel();
        Ok(())
    }
}

/// Client half of a `ConnectStream` exchange: outbound messages feed the
/// request stream, inbound messages come from the response stream.
pub struct GrpcClientConnection {
    name: String,
    outbound: Mutex<Option<mpsc::Sender<Package>>>,
    inbound: Mutex<Streaming<Package>>,
    closed: CancellationToken,
}

impl GrpcClientConnection {
    pub fn new(
        name: impl Into<String>,
        outbound: mpsc::Sender<Package>,
        inbound: Streaming<Package>,
    ) -> Self {
        Self {
            name: name.into(),
            outbound: Mutex::new(Some(outbound)),
            inbound: Mutex::new(inbound),
            closed: CancellationToken::new(),
        }
    }
}

#[tonic::async_trait]
impl Connection for GrpcClientConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, data: Bytes) -> Result<(), StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let tx = {
            let guard = self.outbound.lock().await;
            guard.clone().ok_or(StreamError::ConnectionClosed)?
        };
        tx.send(Package { content: data.to_vec() }).await.map_err(|_| {
            self.closed.cancel();
            StreamError::ConnectionClosed
        })
    }

    async fn receive(&self) -> Result<Bytes, StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let mut inbound = self.inbound.lock().await;
        let message = tokio::select! {
            _ = self.closed.cancelled() => return Err(StreamError::ConnectionClosed),
            message = inbound.message() => message,
        };
        match message {
            Ok(Some(package)) => Ok(Bytes::from(package.content)),
            Ok(None) | Err(_) => {
                self.closed.cancel();
                Err(StreamError::ConnectionClosed)
            }
        }
    }

    async fn close(&self) -> Result<(), StreamError> {
        self.closed.cancel();
        // Dropping the sender half-closes the request stream.
        self.outbound.lock().await.take();
        Ok(())
    }
}
