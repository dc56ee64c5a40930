// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scaf: a rendezvous relay that pairs two inbound connections on one
//! server into a single end-to-end bidirectional message stream.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod streams;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::auth::TokenAuthenticator;
use crate::config::ServerConfig;
use crate::streams::StreamManager;
use crate::transport::{build_router, AppState};

/// Run the scaf server until shutdown.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();

    let key = config.decoded_jwt_key()?;
    let generated_key = key.is_none();
    let authenticator = Arc::new(TokenAuthenticator::new(config.jwt_issuer.clone(), key));

    if generated_key {
        // With a generated key no credential can survive a restart, so mint
        // the only possible admin token up front.
        let token = authenticator.issue(auth::users::ADMIN_USERNAME, None)?;
        println!("{token}");
    }

    let manager = Arc::new(StreamManager::new());
    let state = Arc::new(AppState::new(authenticator, Arc::clone(&manager)));
    let router = build_router(state);

    let listener = TcpListener::bind(&config.listen).await?;
    info!("scaf listening on {}", listener.local_addr()?);

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        });
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    // Transports are down; tear down all streams.
    manager.stop_all().await;
    Ok(())
}
