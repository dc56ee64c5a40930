// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP/JSON integration tests against an in-process server.

use std::sync::Arc;

use scaf::test_support::{spawn_server, test_state};
use scaf::transport::AppState;

struct TestServer {
    base: String,
    state: Arc<AppState>,
    client: reqwest::Client,
    _handle: tokio::task::JoinHandle<()>,
}

async fn server() -> anyhow::Result<TestServer> {
    let state = test_state();
    let (addr, handle) = spawn_server(Arc::clone(&state)).await?;
    Ok(TestServer {
        base: format!("http://{addr}"),
        state,
        client: reqwest::Client::new(),
        _handle: handle,
    })
}

impl TestServer {
    fn token_for(&self, subject: &str) -> anyhow::Result<String> {
        Ok(self.state.authenticator.issue(subject, None)?)
    }

    async fn create_stream(
        &self,
        token: &str,
        body: serde_json::Value,
    ) -> anyhow::Result<serde_json::Value> {
        let resp = self
            .client
            .post(format!("{}/v1/streams", self.base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        anyhow::ensure!(resp.status() == 201, "create stream: {}", resp.status());
        Ok(resp.json().await?)
    }
}

#[tokio::test]
async fn health_reports_running() -> anyhow::Result<()> {
    let srv = server().await?;
    let resp: serde_json::Value =
        srv.client.get(format!("{}/healthz", srv.base)).send().await?.json().await?;
    assert_eq!(resp["status"], "running");
    assert_eq!(resp["streams"], 0);
    Ok(())
}

#[tokio::test]
async fn token_then_self_subject_review() -> anyhow::Result<()> {
    let srv = server().await?;

    // Anonymous callers may mint a token.
    let resp = srv.client.post(format!("{}/v1/tokens", srv.base)).send().await?;
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await?;
    let subject = body["metadata"]["name"].as_str().unwrap_or_default().to_owned();
    let token = body["status"]["token"].as_str().unwrap_or_default().to_owned();
    assert!(subject.starts_with("user:"), "subject: {subject}");
    assert!(!token.is_empty());

    // The minted token reviews as its subject.
    let resp = srv
        .client
        .post(format!("{}/v1/selfsubjectreviews", srv.base))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), 201);
    let review: serde_json::Value = resp.json().await?;
    assert_eq!(review["status"]["userInfo"]["username"], subject.as_str());

    // No token: 401 with the structured error body.
    let resp = srv.client.post(format!("{}/v1/selfsubjectreviews", srv.base)).send().await?;
    assert_eq!(resp.status(), 401);
    let err: serde_json::Value = resp.json().await?;
    assert_eq!(err["code"], 401);
    assert_eq!(err["reason"], "Unauthorized");
    Ok(())
}

#[tokio::test]
async fn stream_crud_and_authorization() -> anyhow::Result<()> {
    let srv = server().await?;
    let owner = srv.token_for("user:owner0000000000")?;
    let other = srv.token_for("user:other0000000000")?;
    let admin = srv.token_for("system:admin")?;

    let created = srv
        .create_stream(
            &owner,
            serde_json::json!({
                "metadata": {"annotations": {"scaf.io/command": "bash"}},
                "spec": {"stopPolicy": "OnDelete"},
            }),
        )
        .await?;
    let uid = created["metadata"]["uid"].as_str().unwrap_or_default().to_owned();
    let stream_token = created["status"]["token"].as_str().unwrap_or_default().to_owned();
    assert!(!uid.is_empty());
    assert_eq!(created["metadata"]["name"], uid.as_str());
    assert_eq!(created["metadata"]["owners"][0], "user:owner0000000000");
    assert_eq!(created["metadata"]["annotations"]["scaf.io/command"], "bash");
    assert!(!stream_token.is_empty());

    // Owner, admin, and the stream-scoped token read it; others do not.
    for token in [&owner, &admin, &stream_token] {
        let resp = srv
            .client
            .get(format!("{}/v1/streams/{uid}", srv.base))
            .bearer_auth(token)
            .send()
            .await?;
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await?;
        assert_eq!(body["metadata"]["uid"], uid.as_str());
    }
    let resp =
        srv.client.get(format!("{}/v1/streams/{uid}", srv.base)).bearer_auth(&other).send().await?;
    assert_eq!(resp.status(), 403);
    let err: serde_json::Value = resp.json().await?;
    assert_eq!(err["reason"], "Forbidden");

    // Listing is restricted to owned streams.
    srv.create_stream(&other, serde_json::json!({})).await?;
    let list: serde_json::Value = srv
        .client
        .get(format!("{}/v1/streams", srv.base))
        .bearer_auth(&owner)
        .send()
        .await?
        .json()
        .await?;
    let items = list["items"].as_array().cloned().unwrap_or_default();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["metadata"]["uid"], uid.as_str());

    let all: serde_json::Value = srv
        .client
        .get(format!("{}/v1/streams", srv.base))
        .bearer_auth(&admin)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(all["items"].as_array().map(Vec::len), Some(2));

    // Anonymous listing is forbidden.
    let resp = srv.client.get(format!("{}/v1/streams", srv.base)).send().await?;
    assert_eq!(resp.status(), 403);

    // Delete succeeds once, then 404s.
    let resp = srv
        .client
        .delete(format!("{}/v1/streams/{uid}", srv.base))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(resp.status(), 200);
    let status: serde_json::Value = resp.json().await?;
    assert_eq!(status["code"], 200);
    assert_eq!(status["reason"], "OK");

    let resp = srv
        .client
        .delete(format!("{}/v1/streams/{uid}", srv.base))
        .bearer_auth(&owner)
        .send()
        .await?;
    assert_eq!(resp.status(), 404);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> anyhow::Result<()> {
    let srv = server().await?;
    let token = srv.token_for("user:owner0000000000")?;
    let resp = srv
        .client
        .post(format!("{}/v1/streams", srv.base))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;
    assert_eq!(resp.status(), 400);
    let err: serde_json::Value = resp.json().await?;
    assert_eq!(err["reason"], "BadRequest");
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_unauthorized() -> anyhow::Result<()> {
    let srv = server().await?;
    let resp = srv
        .client
        .get(format!("{}/v1/streams", srv.base))
        .bearer_auth("bogus.token.value")
        .send()
        .await?;
    assert_eq!(resp.status(), 401);
    let err: serde_json::Value = resp.json().await?;
    assert_eq!(err["reason"], "Unauthorized");
    Ok(())
}
