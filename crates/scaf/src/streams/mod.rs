// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream pairing core: the connection abstraction, the buffered two-slot
//! relay, and the in-memory stream registry.

pub mod buffered;
pub mod conn_grpc;
pub mod conn_websocket;
pub mod conn_with_log;
pub mod connection;
pub mod manager;

pub use buffered::{BufferedStream, ConnectionEvent};
pub use connection::Connection;
pub use manager::{StreamInstance, StreamManager};

use std::fmt;

/// Sentinel errors surfaced by the stream core. Mapped to API errors at the
/// transport boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamError {
    AlreadyStarted,
    AlreadyStopped,
    Full,
    NotFound,
    ConnectionClosed,
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::AlreadyStarted => "stream already started",
            Self::AlreadyStopped => "stream already stopped",
            Self::Full => "stream is full",
            Self::NotFound => "stream not found",
            Self::ConnectionClosed => "connection closed",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for StreamError {}
