// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use super::meta::ObjectMeta;

/// A rendezvous stream pairing two connections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: StreamSpec,
    #[serde(default)]
    pub status: StreamStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSpec {
    #[serde(default)]
    pub stop_policy: StopPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamStatus {
    /// Stream-scoped token minted at creation; the sole credential a peer
    /// needs to join this stream.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamList {
    #[serde(default)]
    pub items: Vec<Stream>,
}

/// Rule deciding when a stream moves from Active to Stopped based on
/// attach/detach events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopPolicy {
    /// Stop as soon as either connection leaves.
    OnFirstConnectionLeft,
    /// Stop once all connections have left, after at least one joined.
    OnBothConnectionsLeft,
    /// Only stop on explicit deletion.
    #[default]
    OnDelete,
}

impl StopPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnFirstConnectionLeft => "OnFirstConnectionLeft",
            Self::OnBothConnectionsLeft => "OnBothConnectionsLeft",
            Self::OnDelete => "OnDelete",
        }
    }

    /// Parse a policy name. Empty means the default (`OnDelete`).
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "" | "OnDelete" => Some(Self::OnDelete),
            "OnFirstConnectionLeft" => Some(Self::OnFirstConnectionLeft),
            "OnBothConnectionsLeft" => Some(Self::OnBothConnectionsLeft),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "stream_tests.rs"]
mod tests;
