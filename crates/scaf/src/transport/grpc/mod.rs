// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! gRPC front end implementing the `yhlooo.com.scaf` services.

pub mod convert;
mod service;

use std::pin::Pin;
use std::sync::Arc;

use tonic::service::interceptor::InterceptedService;
use tonic::{Request, Status};

use crate::api::proto;

use super::AppState;

/// Metadata key carrying the bearer token.
pub const METADATA_KEY_TOKEN: &str = "scaf-token";
/// Metadata key naming the stream to connect.
pub const METADATA_KEY_STREAM_NAME: &str = "scaf-stream-name";
/// Metadata key labeling the joining connection.
pub const METADATA_KEY_CONNECTION_NAME: &str = "scaf-connection-name";

/// Bearer token extracted from request metadata by the interceptor.
#[derive(Debug, Clone)]
pub struct MetadataToken(pub String);

/// Correlation id attached to each request for log correlation.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// gRPC implementation of both scaf services.
#[derive(Clone)]
pub struct ScafGrpc {
    state: Arc<AppState>,
}

impl ScafGrpc {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// Interceptor moving the `scaf-token` metadata into request extensions and
/// stamping a request id. Applied to unary and streaming RPCs alike.
#[derive(Clone)]
pub struct ScafInterceptor;

impl tonic::service::Interceptor for ScafInterceptor {
    fn call(&mut self, mut req: Request<()>) -> Result<Request<()>, Status> {
        let token = req
            .metadata()
            .get(METADATA_KEY_TOKEN)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        if let Some(token) = token {
            req.extensions_mut().insert(MetadataToken(token));
        }
        req.extensions_mut().insert(RequestId(uuid::Uuid::new_v4().to_string()));
        Ok(req)
    }
}

pub type AuthenticationService = InterceptedService<
    proto::authn::v1::authentication_server::AuthenticationServer<ScafGrpc>,
    ScafInterceptor,
>;

pub type StreamsService =
    InterceptedService<proto::stream::v1::streams_server::StreamsServer<ScafGrpc>, ScafInterceptor>;

/// The `Authentication` service with metadata interception.
pub fn authentication_service(state: Arc<AppState>) -> AuthenticationService {
    proto::authn::v1::authentication_server::AuthenticationServer::with_interceptor(
        ScafGrpc::new(state),
        ScafInterceptor,
    )
}

/// The `Streams` service with metadata interception.
pub fn streams_service(state: Arc<AppState>) -> StreamsService {
    proto::stream::v1::streams_server::StreamsServer::with_interceptor(
        ScafGrpc::new(state),
        ScafInterceptor,
    )
}

type GrpcStream<T> = Pin<Box<dyn tokio_stream::Stream<Item = Result<T, Status>> + Send + 'static>>;

/// The bearer token attached by [`ScafInterceptor`], if any.
fn metadata_token<T>(request: &Request<T>) -> Option<String> {
    request.extensions().get::<MetadataToken>().map(|token| token.0.clone())
}

/// The request id attached by [`ScafInterceptor`].
fn request_id<T>(request: &Request<T>) -> String {
    request.extensions().get::<RequestId>().map(|id| id.0.clone()).unwrap_or_default()
}
