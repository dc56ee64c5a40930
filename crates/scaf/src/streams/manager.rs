// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory stream registry and stop-policy watchers.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::stream::{StopPolicy, Stream};

use super::buffered::{BufferedStream, ConnectionEvent};
use super::StreamError;

/// A registered stream: the API object plus the relay core.
///
/// Cloning deep-copies the API object (callers may mutate it freely) while
/// sharing the underlying relay core.
#[derive(Clone)]
pub struct StreamInstance {
    pub object: Stream,
    pub stream: Arc<BufferedStream>,
}

/// Process-wide registry mapping stream UID to instance.
pub struct StreamManager {
    streams: RwLock<HashMap<String, StreamInstance>>,
}

impl StreamManager {
    pub fn new() -> Self {
        Self { streams: RwLock::new(HashMap::new()) }
    }

    /// Register a new stream: assign a fresh UID (also used as the name),
    /// start the relay core, and attach the stop-policy watcher before the
    /// stream becomes visible in the registry.
    pub async fn create_stream(&self, mut object: Stream) -> Result<StreamInstance, StreamError> {
        let uid = Uuid::new_v4().to_string();
        object.metadata.uid = uid.clone();
        object.metadata.name = uid.clone();

        let stream = Arc::new(BufferedStream::new());
        stream.start().await?;
        spawn_stop_policy_watcher(&uid, object.spec.stop_policy, &stream).await;

        let instance = StreamInstance { object, stream };
        let mut streams = self.streams.write().await;
        streams.insert(uid.clone(), instance.clone());
        debug!(stream = %uid, "stream created");
        Ok(instance)
    }

    pub async fn get_stream(&self, uid: &str) -> Result<StreamInstance, StreamError> {
        self.streams.read().await.get(uid).cloned().ok_or(StreamError::NotFound)
    }

    /// All registered streams, sorted by UID for stable output.
    pub async fn list_streams(&self) -> Vec<StreamInstance> {
        let streams = self.streams.read().await;
        let mut list: Vec<StreamInstance> = streams.values().cloned().collect();
        list.sort_by(|a, b| a.object.metadata.uid.cmp(&b.object.metadata.uid));
        list
    }

    /// Remove a stream from the registry and stop it. The stop happens
    /// outside the registry lock; an already-stopped stream (e.g. by
    /// policy) is removed without error.
    pub async fn delete_stream(&self, uid: &str) -> Result<(), StreamError> {
        let instance = {
            let mut streams = self.streams.write().await;
            streams.remove(uid).ok_or(StreamError::NotFound)?
        };
        match instance.stream.stop().await {
            Ok(()) | Err(StreamError::AlreadyStopped) => {}
            Err(err) => warn!(stream = %uid, "stop stream error: {err}"),
        }
        debug!(stream = %uid, "stream deleted");
        Ok(())
    }

    /// Stop every registered stream (server shutdown). Entries stay in the
    /// registry; the process is going away.
    pub async fn stop_all(&self) {
        let instances: Vec<StreamInstance> =
            self.streams.read().await.values().cloned().collect();
        for instance in instances {
            let _ = instance.stream.stop().await;
        }
    }
}

impl Default for StreamManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Consume the stream's event channel and stop it when the policy fires.
/// Must run before the stream is published so no event is missed.
async fn spawn_stop_policy_watcher(uid: &str, policy: StopPolicy, stream: &Arc<BufferedStream>) {
    if policy == StopPolicy::OnDelete {
        return;
    }
    let Some(mut events) = stream.take_events().await else {
        return;
    };
    let stream = Arc::clone(stream);
    let uid = uid.to_owned();
    tokio::spawn(async move {
        let mut attached: i64 = 0;
        let mut seen_join = false;
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Joined(_) => {
                    attached += 1;
                    seen_join = true;
                }
                ConnectionEvent::Left(_) => {
                    attached -= 1;
                    let fire = match policy {
                        StopPolicy::OnFirstConnectionLeft => true,
                        StopPolicy::OnBothConnectionsLeft => seen_join && attached <= 0,
                        StopPolicy::OnDelete => false,
                    };
                    if fire {
                        debug!(stream = %uid, policy = policy.as_str(), "stop policy fired");
                        match stream.stop().await {
                            Ok(()) | Err(StreamError::AlreadyStopped) => {}
                            Err(err) => warn!(stream = %uid, "stop stream error: {err}"),
                        }
                        // The stop dropped the sender; drain until close.
                    }
                }
            }
        }
    });
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
