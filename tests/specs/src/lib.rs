// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test harness for end-to-end binary smoke tests.
//!
//! Spawns the real `scaf` binary as a subprocess and exercises it over
//! HTTP, WebSocket, and gRPC.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;

/// Resolve the path to the compiled `scaf` binary.
pub fn scaf_binary() -> PathBuf {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR"));
    // tests/specs → tests → workspace root
    let workspace = manifest.parent().and_then(|p| p.parent()).unwrap_or(manifest);
    workspace.join("target").join("debug").join("scaf")
}

/// Find a free TCP port by binding to :0 then releasing.
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}

/// A running `scaf serve` process that is killed on drop.
pub struct ScafProcess {
    child: Child,
    port: u16,
    admin_token: String,
}

impl ScafProcess {
    /// Start `scaf serve` without a configured signing key and capture the
    /// admin token it prints to stdout.
    pub fn start() -> anyhow::Result<Self> {
        let port = free_port()?;
        let mut child = Command::new(scaf_binary())
            .args(["serve", "-l", &format!("127.0.0.1:{port}")])
            .env("RUST_LOG", "info")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        let stdout =
            child.stdout.take().ok_or_else(|| anyhow::anyhow!("child stdout not captured"))?;
        let admin_token = read_line_with_timeout(stdout, Duration::from_secs(10))?;
        anyhow::ensure!(
            admin_token.split('.').count() == 3,
            "expected a JWT on stdout, got {admin_token:?}"
        );

        Ok(Self { child, port, admin_token })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://127.0.0.1:{}{path}", self.port)
    }

    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Poll `/healthz` until the server answers.
    pub async fn wait_healthy(&self, timeout: Duration) -> anyhow::Result<()> {
        let client = reqwest::Client::new();
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Ok(resp) = client.get(format!("{}/healthz", self.base_url())).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            anyhow::ensure!(tokio::time::Instant::now() < deadline, "server never became healthy");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

impl Drop for ScafProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Read one stdout line on a helper thread so a wedged child cannot hang
/// the test.
fn read_line_with_timeout(
    stdout: std::process::ChildStdout,
    timeout: Duration,
) -> anyhow::Result<String> {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let mut reader = BufReader::new(stdout);
        let mut line = String::new();
        let result = reader.read_line(&mut line).map(|_| line.trim().to_owned());
        let _ = tx.send(result);
    });
    match rx.recv_timeout(timeout) {
        Ok(Ok(line)) if !line.is_empty() => Ok(line),
        Ok(Ok(_)) => Err(anyhow::anyhow!("child printed an empty line")),
        Ok(Err(err)) => Err(anyhow::anyhow!("read child stdout: {err}")),
        Err(_) => Err(anyhow::anyhow!("timed out waiting for child stdout")),
    }
}
