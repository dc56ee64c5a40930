// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end smoke tests that spawn the real `scaf` binary and exercise
//! the HTTP, WebSocket, and gRPC surfaces on its single port.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;

use scaf::api::proto;
use scaf_specs::ScafProcess;

const TIMEOUT: Duration = Duration::from_secs(10);

async fn create_stream(
    scaf: &ScafProcess,
    client: &reqwest::Client,
) -> anyhow::Result<(String, String)> {
    let resp = client
        .post(format!("{}/v1/streams", scaf.base_url()))
        .bearer_auth(scaf.admin_token())
        .json(&serde_json::json!({}))
        .send()
        .await?;
    anyhow::ensure!(resp.status() == 201, "create stream: {}", resp.status());
    let body: serde_json::Value = resp.json().await?;
    let uid = body["metadata"]["uid"].as_str().unwrap_or_default().to_owned();
    let token = body["status"]["token"].as_str().unwrap_or_default().to_owned();
    anyhow::ensure!(!uid.is_empty() && !token.is_empty(), "bad create response: {body}");
    Ok((uid, token))
}

async fn ws_connect(
    scaf: &ScafProcess,
    uid: &str,
    token: &str,
    name: &str,
) -> anyhow::Result<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
> {
    let mut request = scaf.ws_url(&format!("/v1/streams/{uid}")).into_client_request()?;
    request
        .headers_mut()
        .insert("authorization", HeaderValue::from_str(&format!("Bearer {token}"))?);
    request.headers_mut().insert("x-scaf-connection-name", HeaderValue::from_str(name)?);
    let (stream, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(stream)
}

#[tokio::test]
async fn serve_prints_admin_token_and_answers_health() -> anyhow::Result<()> {
    let scaf = ScafProcess::start()?;
    scaf.wait_healthy(TIMEOUT).await?;

    let resp: serde_json::Value =
        reqwest::get(format!("{}/healthz", scaf.base_url())).await?.json().await?;
    assert_eq!(resp["status"], "running");

    // The printed token really is the admin credential.
    let client = reqwest::Client::new();
    let review = client
        .post(format!("{}/v1/selfsubjectreviews", scaf.base_url()))
        .bearer_auth(scaf.admin_token())
        .send()
        .await?;
    assert_eq!(review.status(), 201);
    let review: serde_json::Value = review.json().await?;
    assert_eq!(review["status"]["userInfo"]["username"], "system:admin");
    Ok(())
}

#[tokio::test]
async fn websocket_pair_relays_and_delete_tears_down() -> anyhow::Result<()> {
    let scaf = ScafProcess::start()?;
    scaf.wait_healthy(TIMEOUT).await?;
    let client = reqwest::Client::new();
    let (uid, token) = create_stream(&scaf, &client).await?;

    let (mut a_tx, _a_rx) = ws_connect(&scaf, &uid, &token, "a").await?.split();
    let (_b_tx, mut b_rx) = ws_connect(&scaf, &uid, &token, "b").await?.split();

    a_tx.send(Message::Binary(bytes(b"smoke-frame"))).await?;
    let frame = tokio::time::timeout(TIMEOUT, b_rx.next())
        .await
        .map_err(|_| anyhow::anyhow!("recv timeout"))?
        .ok_or_else(|| anyhow::anyhow!("ws closed"))??;
    assert_eq!(frame.into_data().as_ref(), b"smoke-frame");

    // Delete the stream, then reads observe closure.
    let resp = client
        .delete(format!("{}/v1/streams/{uid}", scaf.base_url()))
        .bearer_auth(scaf.admin_token())
        .send()
        .await?;
    assert_eq!(resp.status(), 200);

    let resp = client
        .get(format!("{}/v1/streams/{uid}", scaf.base_url()))
        .bearer_auth(scaf.admin_token())
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn grpc_and_websocket_share_the_port() -> anyhow::Result<()> {
    let scaf = ScafProcess::start()?;
    scaf.wait_healthy(TIMEOUT).await?;
    let client = reqwest::Client::new();
    let (uid, token) = create_stream(&scaf, &client).await?;

    // Side A over WebSocket.
    let (mut a_tx, mut a_rx) = ws_connect(&scaf, &uid, &token, "ws-side").await?.split();

    // Side B over gRPC, against the very same port.
    let channel =
        tonic::transport::Channel::from_shared(scaf.base_url())?.connect().await?;
    let mut grpc = proto::stream::v1::streams_client::StreamsClient::new(channel);
    let (b_tx, rx) = tokio::sync::mpsc::channel(16);
    let mut request = tonic::Request::new(tokio_stream::wrappers::ReceiverStream::new(rx));
    request.metadata_mut().insert("scaf-token", token.parse()?);
    request.metadata_mut().insert("scaf-stream-name", uid.parse()?);
    request.metadata_mut().insert("scaf-connection-name", "grpc-side".parse()?);
    let mut b_rx = grpc.connect_stream(request).await?.into_inner();

    a_tx.send(Message::Binary(bytes(b"ping"))).await?;
    let package = tokio::time::timeout(TIMEOUT, b_rx.message())
        .await
        .map_err(|_| anyhow::anyhow!("grpc recv timeout"))??
        .ok_or_else(|| anyhow::anyhow!("grpc stream ended"))?;
    assert_eq!(package.content, b"ping");

    b_tx.send(proto::stream::v1::Package { content: b"pong".to_vec() }).await?;
    let frame = tokio::time::timeout(TIMEOUT, a_rx.next())
        .await
        .map_err(|_| anyhow::anyhow!("ws recv timeout"))?
        .ok_or_else(|| anyhow::anyhow!("ws closed"))??;
    assert_eq!(frame.into_data().as_ref(), b"pong");
    Ok(())
}

fn bytes(data: &'static [u8]) -> tokio_tungstenite::tungstenite::Bytes {
    tokio_tungstenite::tungstenite::Bytes::from_static(data)
}
