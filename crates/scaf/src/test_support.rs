// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for unit and integration tests.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::auth::TokenAuthenticator;
use crate::streams::connection::Connection;
use crate::streams::{StreamError, StreamManager};
use crate::transport::{build_router, AppState};

/// In-memory [`Connection`]: messages sent on one end of a pair are received
/// on the other. Closing one end surfaces `ConnectionClosed` on both.
pub struct ChannelConnection {
    name: String,
    tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    rx: Mutex<mpsc::Receiver<Bytes>>,
    closed: CancellationToken,
}

/// Build a connected pair of in-memory connections.
pub fn connection_pair(
    name_a: impl Into<String>,
    name_b: impl Into<String>,
) -> (Arc<ChannelConnection>, Arc<ChannelConnection>) {
    let (tx_ab, rx_ab) = mpsc::channel(64);
    let (tx_ba, rx_ba) = mpsc::channel(64);
    let a = Arc::new(ChannelConnection {
        name: name_a.into(),
        tx: Mutex::new(Some(tx_ab)),
        rx: Mutex::new(rx_ba),
        closed: CancellationToken::new(),
    });
    let b = Arc::new(ChannelConnection {
        name: name_b.into(),
        tx: Mutex::new(Some(tx_ba)),
        rx: Mutex::new(rx_ab),
        closed: CancellationToken::new(),
    });
    (a, b)
}

#[tonic::async_trait]
impl Connection for ChannelConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, data: Bytes) -> Result<(), StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let tx = {
            let guard = self.tx.lock().await;
            guard.clone().ok_or(StreamError::ConnectionClosed)?
        };
        tx.send(data).await.map_err(|_| StreamError::ConnectionClosed)
    }

    async fn receive(&self) -> Result<Bytes, StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let mut rx = self.rx.lock().await;
        tokio::select! {
            _ = self.closed.cancelled() => Err(StreamError::ConnectionClosed),
            data = rx.recv() => data.ok_or(StreamError::ConnectionClosed),
        }
    }

    async fn close(&self) -> Result<(), StreamError> {
        self.closed.cancel();
        // Dropping the sender lets the peer observe the disconnect.
        self.tx.lock().await.take();
        Ok(())
    }
}

/// Build server state with a fixed-key authenticator for deterministic
/// tokens across helpers.
pub fn test_state() -> Arc<AppState> {
    let authenticator = Arc::new(TokenAuthenticator::new("scaf-test", Some(b"scaf-test-key".to_vec())));
    let manager = Arc::new(StreamManager::new());
    Arc::new(AppState::new(authenticator, manager))
}

/// Spawn an in-process server on an ephemeral port.
pub async fn spawn_server(
    state: Arc<AppState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}
