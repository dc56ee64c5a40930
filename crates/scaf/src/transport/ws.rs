// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket attachment of stream connections.

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use bytes::Bytes;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::streams::conn_websocket::WebSocketConnection;
use crate::streams::conn_with_log::ConnectionWithLog;
use crate::streams::{Connection, StreamInstance};

use super::auth::BearerToken;
use super::AppState;

/// Request header naming the joining connection (log label only).
pub const HEADER_CONNECTION_NAME: &str = "x-scaf-connection-name";

/// `GET /v1/streams/{name}` — a plain JSON read, or a stream join when the
/// request is a WebSocket upgrade.
pub async fn get_or_connect_stream(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Extension(token): Extension<BearerToken>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, axum::extract::ws::rejection::WebSocketUpgradeRejection>,
) -> Response {
    let Ok(upgrade) = upgrade else {
        return match state.streams.get_stream(token.as_deref(), &name).await {
            Ok(stream) => Json(stream).into_response(),
            Err(err) => err.into_response(),
        };
    };

    // Authorize before upgrading; failures keep their HTTP status.
    let instance = match state.streams.get_stream_instance(token.as_deref(), &name).await {
        Ok(instance) => instance,
        Err(err) => return err.into_response(),
    };

    let conn_name = headers
        .get(HEADER_CONNECTION_NAME)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned();
    info!(stream = %name, conn = %conn_name, "websocket connect request");

    upgrade.on_upgrade(move |socket| join_stream(socket, instance, conn_name, name))
}

/// Join the upgraded socket to the stream. On failure the error status is
/// sent as a JSON frame before closing — the HTTP status is already 101.
async fn join_stream(
    socket: WebSocket,
    instance: StreamInstance,
    conn_name: String,
    stream_name: String,
) {
    let conn: Arc<dyn Connection> =
        Arc::new(ConnectionWithLog::new(Arc::new(WebSocketConnection::new(conn_name, socket))));

    if let Err(err) = instance.stream.join(Arc::clone(&conn)).await {
        warn!(stream = %stream_name, conn = %conn.name(), "join stream error: {err}");
        let status = ApiError::internal(format!("join stream error: {err}")).to_status_body();
        if let Ok(body) = serde_json::to_vec(&status) {
            let _ = conn.send(Bytes::from(body)).await;
        }
        let _ = conn.close().await;
    }
    // On success the stream owns the connection; its read loop keeps the
    // socket alive after this task returns.
}
