// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket + gRPC front ends sharing one listener.
//!
//! Both gRPC services are mounted inside the axum router at their canonical
//! service paths, so a single port serves JSON, WebSocket upgrades, and
//! gRPC without a separate listener.

pub mod auth;
pub mod grpc;
pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::TokenAuthenticator;
use crate::server::{AuthenticationServer, StreamsServer};
use crate::streams::StreamManager;

/// Maximum accepted request body.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared server state.
pub struct AppState {
    pub authenticator: Arc<TokenAuthenticator>,
    pub authn: AuthenticationServer,
    pub streams: StreamsServer,
    pub manager: Arc<StreamManager>,
}

impl AppState {
    pub fn new(authenticator: Arc<TokenAuthenticator>, manager: Arc<StreamManager>) -> Self {
        Self {
            authn: AuthenticationServer::new(Arc::clone(&authenticator)),
            streams: StreamsServer::new(Arc::clone(&authenticator), Arc::clone(&manager)),
            authenticator,
            manager,
        }
    }
}

/// Build the axum router serving the JSON API, WebSocket upgrades, and both
/// gRPC services.
pub fn build_router(state: Arc<AppState>) -> Router {
    let grpc_authn = grpc::authentication_service(Arc::clone(&state));
    let grpc_streams = grpc::streams_service(Arc::clone(&state));

    Router::new()
        // Health (no auth)
        .route("/healthz", get(http::health))
        // Authentication
        .route("/v1/tokens", post(http::create_token))
        .route("/v1/selfsubjectreviews", post(http::create_self_subject_review))
        // Streams
        .route("/v1/streams", post(http::create_stream).get(http::list_streams))
        .route(
            "/v1/streams/{name}",
            get(ws::get_or_connect_stream).delete(http::delete_stream),
        )
        // gRPC services on the same port
        .route_service("/yhlooo.com.scaf.authn.v1.Authentication/{*rpc}", grpc_authn)
        .route_service("/yhlooo.com.scaf.stream.v1.Streams/{*rpc}", grpc_streams)
        // Middleware
        .layer(middleware::from_fn(auth::bearer_layer))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
