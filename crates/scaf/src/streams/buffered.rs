// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The buffered two-slot relay: pairs at most two connections and forwards
//! messages between them, buffering while only one side is attached.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::connection::Connection;
use super::StreamError;

/// Cap on messages buffered per side while the peer is absent. Overflow
/// drops the newest message.
const MAX_BUFFERED_MESSAGES: usize = 256;

/// Backoff after a read error that is not a close.
const READ_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Attach/detach events use non-blocking sends: anything beyond this backlog
/// is dropped. The stop-policy watcher attaches before the stream is
/// published, so it observes every transition.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Attach/detach notification emitted by a [`BufferedStream`].
#[derive(Clone)]
pub enum ConnectionEvent {
    Joined(Arc<dyn Connection>),
    Left(Arc<dyn Connection>),
}

impl ConnectionEvent {
    pub fn connection(&self) -> &Arc<dyn Connection> {
        match self {
            Self::Joined(conn) | Self::Left(conn) => conn,
        }
    }
}

/// The two symmetric attachment points of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    A,
    B,
}

impl Side {
    fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Occupancy of one slot.
///
/// `Joining` reserves the slot while the backlog buffered for it is still
/// flushing; the peer's read loop keeps buffering until the slot is `Ready`,
/// which is what guarantees buffered messages precede live ones.
#[derive(Clone, Default)]
enum Slot {
    #[default]
    Empty,
    Joining(Arc<dyn Connection>),
    Ready(Arc<dyn Connection>),
}

impl Slot {
    fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    fn ready(&self) -> Option<Arc<dyn Connection>> {
        match self {
            Slot::Ready(conn) => Some(Arc::clone(conn)),
            _ => None,
        }
    }

    fn occupant(&self) -> Option<Arc<dyn Connection>> {
        match self {
            Slot::Joining(conn) | Slot::Ready(conn) => Some(Arc::clone(conn)),
            Slot::Empty => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    New,
    Active,
    Stopped,
}

struct Shared {
    phase: Phase,
    slot_a: Slot,
    slot_b: Slot,
    /// Messages read from B while slot A had no ready occupant; delivered to
    /// A when it joins. `buffer_b` is the mirror image.
    buffer_a: VecDeque<Bytes>,
    buffer_b: VecDeque<Bytes>,
    events_tx: Option<mpsc::Sender<ConnectionEvent>>,
    events_rx: Option<mpsc::Receiver<ConnectionEvent>>,
}

impl Shared {
    fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::A => &self.slot_a,
            Side::B => &self.slot_b,
        }
    }

    fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::A => &mut self.slot_a,
            Side::B => &mut self.slot_b,
        }
    }

    fn buffer_mut(&mut self, side: Side) -> &mut VecDeque<Bytes> {
        match side {
            Side::A => &mut self.buffer_a,
            Side::B => &mut self.buffer_b,
        }
    }

    /// Flip `side` from `Joining` to `Ready` if it still holds `conn`.
    fn promote(&mut self, side: Side, conn: &Arc<dyn Connection>) {
        let slot = self.slot_mut(side);
        if let Slot::Joining(current) = slot {
            if Arc::ptr_eq(current, conn) {
                *slot = Slot::Ready(Arc::clone(conn));
            }
        }
    }

    /// Empty `side` if it still holds `conn`.
    fn vacate(&mut self, side: Side, conn: &Arc<dyn Connection>) {
        let slot = self.slot_mut(side);
        if let Slot::Joining(current) | Slot::Ready(current) = slot {
            if Arc::ptr_eq(current, conn) {
                *slot = Slot::Empty;
            }
        }
    }
}

/// A stream pairing at most two connections into one bidirectional relay.
///
/// Lifecycle is `New → Active → Stopped`; connections may only join while
/// Active. Messages read from one slot are forwarded to the other, or
/// buffered (up to [`MAX_BUFFERED_MESSAGES`]) while the other slot is empty.
pub struct BufferedStream {
    shared: Arc<RwLock<Shared>>,
}

impl BufferedStream {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(RwLock::new(Shared {
                phase: Phase::New,
                slot_a: Slot::Empty,
                slot_b: Slot::Empty,
                buffer_a: VecDeque::new(),
                buffer_b: VecDeque::new(),
                events_tx: Some(events_tx),
                events_rx: Some(events_rx),
            })),
        }
    }

    /// Move the stream from `New` to `Active`.
    pub async fn start(&self) -> Result<(), StreamError> {
        let mut shared = self.shared.write().await;
        match shared.phase {
            Phase::New => {
                shared.phase = Phase::Active;
                Ok(())
            }
            Phase::Active => Err(StreamError::AlreadyStarted),
            Phase::Stopped => Err(StreamError::AlreadyStopped),
        }
    }

    /// Whether the stream is currently Active.
    pub async fn is_active(&self) -> bool {
        self.shared.read().await.phase == Phase::Active
    }

    /// Take the receiver for attach/detach events. Yields `Some` exactly
    /// once; the channel closes when the stream stops.
    pub async fn take_events(&self) -> Option<mpsc::Receiver<ConnectionEvent>> {
        self.shared.write().await.events_rx.take()
    }

    /// Attach a connection to the first free slot and start relaying.
    ///
    /// Fails with [`StreamError::AlreadyStopped`] unless Active and with
    /// [`StreamError::Full`] when both slots are occupied.
    pub async fn join(&self, conn: Arc<dyn Connection>) -> Result<(), StreamError> {
        let side = {
            let mut shared = self.shared.write().await;
            if shared.phase != Phase::Active {
                return Err(StreamError::AlreadyStopped);
            }
            if shared.slot_a.is_empty() {
                shared.slot_a = Slot::Joining(Arc::clone(&conn));
                Side::A
            } else if shared.slot_b.is_empty() {
                shared.slot_b = Slot::Joining(Arc::clone(&conn));
                Side::B
            } else {
                return Err(StreamError::Full);
            }
        };

        debug!(conn = %conn.name(), slot = ?side, "connection joined stream");

        tokio::spawn(flush_backlog(Arc::clone(&self.shared), side, Arc::clone(&conn)));
        tokio::spawn(read_loop(Arc::clone(&self.shared), side, Arc::clone(&conn)));

        let events_tx = self.shared.read().await.events_tx.clone();
        if let Some(tx) = events_tx {
            let _ = tx.try_send(ConnectionEvent::Joined(conn));
        }
        Ok(())
    }

    /// Move the stream to `Stopped`: close both connections, discard both
    /// buffers, and close the events channel.
    pub async fn stop(&self) -> Result<(), StreamError> {
        let occupants = {
            let mut shared = self.shared.write().await;
            if shared.phase != Phase::Active {
                return Err(StreamError::AlreadyStopped);
            }
            shared.phase = Phase::Stopped;
            let a = std::mem::take(&mut shared.slot_a).occupant();
            let b = std::mem::take(&mut shared.slot_b).occupant();
            shared.buffer_a.clear();
            shared.buffer_b.clear();
            // Dropping the sender closes the channel and ends the watcher.
            shared.events_tx = None;
            [a, b]
        };

        for conn in occupants.into_iter().flatten() {
            if let Err(err) = conn.close().await {
                warn!(conn = %conn.name(), "close connection error: {err}");
            }
        }
        Ok(())
    }
}

impl Default for BufferedStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Deliver the backlog buffered for `side`, then flip the slot to `Ready`.
///
/// The loop re-checks the buffer under the write lock before promoting, so a
/// message appended concurrently by the peer's read loop is never stranded.
async fn flush_backlog(shared: Arc<RwLock<Shared>>, side: Side, conn: Arc<dyn Connection>) {
    loop {
        let pending = {
            let mut guard = shared.write().await;
            if guard.phase != Phase::Active {
                return;
            }
            let buffer = guard.buffer_mut(side);
            if buffer.is_empty() {
                guard.promote(side, &conn);
                return;
            }
            std::mem::take(buffer)
        };

        for data in pending {
            if let Err(err) = conn.send(data).await {
                debug!(conn = %conn.name(), "flush to joining connection error: {err}");
                // The connection is dead; promote anyway so its read loop
                // can unwind the slot through the normal path.
                shared.write().await.promote(side, &conn);
                return;
            }
        }
    }
}

/// Pump messages from `side`'s connection into the peer slot, or into the
/// peer's backlog while it has no ready occupant.
async fn read_loop(shared: Arc<RwLock<Shared>>, side: Side, conn: Arc<dyn Connection>) {
    loop {
        let data = match conn.receive().await {
            Ok(data) => data,
            Err(StreamError::ConnectionClosed) => break,
            Err(err) => {
                warn!(conn = %conn.name(), "read from connection error: {err}");
                tokio::time::sleep(READ_RETRY_INTERVAL).await;
                continue;
            }
        };

        // Sample the peer under the shared lock; the lock is never held
        // across a send.
        let peer = {
            let guard = shared.read().await;
            guard.slot(side.peer()).ready()
        };

        if let Some(peer_conn) = peer {
            if let Err(err) = peer_conn.send(data).await {
                warn!(conn = %peer_conn.name(), "forward to connection error: {err}");
            }
            continue;
        }

        // No ready peer: buffer for it. Re-check under the write lock — the
        // peer may have been promoted since the snapshot, and promotion only
        // happens when this buffer is empty.
        let forward_now = {
            let mut guard = shared.write().await;
            if guard.phase != Phase::Active {
                break;
            }
            match guard.slot(side.peer()).ready() {
                Some(peer_conn) => Some((peer_conn, data)),
                None => {
                    let buffer = guard.buffer_mut(side.peer());
                    if buffer.len() < MAX_BUFFERED_MESSAGES {
                        buffer.push_back(data);
                    }
                    None
                }
            }
        };
        if let Some((peer_conn, data)) = forward_now {
            if let Err(err) = peer_conn.send(data).await {
                warn!(conn = %peer_conn.name(), "forward to connection error: {err}");
            }
        }
    }

    if let Err(err) = conn.close().await {
        debug!(conn = %conn.name(), "close connection error: {err}");
    }
    let events_tx = {
        let mut guard = shared.write().await;
        guard.vacate(side, &conn);
        guard.events_tx.clone()
    };
    debug!(conn = %conn.name(), slot = ?side, "connection left stream");
    if let Some(tx) = events_tx {
        let _ = tx.try_send(ConnectionEvent::Left(conn));
    }
}

#[cfg(test)]
#[path = "buffered_tests.rs"]
mod tests;
