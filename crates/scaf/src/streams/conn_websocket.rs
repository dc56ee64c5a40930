// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::connection::Connection;
use super::StreamError;

/// WebSocket-backed [`Connection`]: one binary frame per message.
///
/// The sink half sits behind a mutex — the underlying library requires a
/// single writer. A local close interrupts a blocked `receive`.
pub struct WebSocketConnection {
    name: String,
    tx: Mutex<SplitSink<WebSocket, Message>>,
    rx: Mutex<SplitStream<WebSocket>>,
    closed: CancellationToken,
}

impl WebSocketConnection {
    pub fn new(name: impl Into<String>, socket: WebSocket) -> Self {
        let (tx, rx) = socket.split();
        Self {
            name: name.into(),
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
            closed: CancellationToken::new(),
        }
    }
}

#[tonic::async_trait]
impl Connection for WebSocketConnection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, data: Bytes) -> Result<(), StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let mut tx = self.tx.lock().await;
        tx.send(Message::Binary(data)).await.map_err(|_| {
            // Any write failure on a WebSocket means the peer is gone.
            self.closed.cancel();
            StreamError::ConnectionClosed
        })
    }

    async fn receive(&self) -> Result<Bytes, StreamError> {
        if self.closed.is_cancelled() {
            return Err(StreamError::ConnectionClosed);
        }
        let mut rx = self.rx.lock().await;
        loop {
            let next = tokio::select! {
                _ = self.closed.cancelled() => return Err(StreamError::ConnectionClosed),
                next = rx.next() => next,
            };
            match next {
                Some(Ok(message @ (Message::Binary(_) | Message::Text(_)))) => {
                    return Ok(message.into_data())
                }
                Some(Ok(Message::Close(_))) | None => {
                    self.closed.cancel();
                    return Err(StreamError::ConnectionClosed);
                }
                // Ping/pong frames are answered by the library.
                Some(Ok(_)) => continue,
                Some(Err(_)) => {
                    self.closed.cancel();
                    return Err(StreamError::ConnectionClosed);
                }
            }
        }
    }

    async fn close(&self) -> Result<(), StreamError> {
        if self.closed.is_cancelled() {
            return Ok(());
        }
        self.closed.cancel();
        let mut tx = self.tx.lock().await;
        let _ = tx.send(Message::Close(None)).await;
        Ok(())
    }
}
