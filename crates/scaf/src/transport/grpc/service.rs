// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC handlers for the `Authentication` and `Streams` services.

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::{Request, Response, Status, Streaming};
use tracing::{info, warn};

use crate::api::proto;
use crate::error::ApiError;
use crate::streams::conn_grpc::GrpcServerConnection;
use crate::streams::conn_with_log::ConnectionWithLog;
use crate::streams::Connection;

use super::{
    convert, metadata_token, request_id, GrpcStream, ScafGrpc, METADATA_KEY_CONNECTION_NAME,
    METADATA_KEY_STREAM_NAME,
};

/// Buffered outbound frames per gRPC stream connection.
const OUTBOUND_CHANNEL_CAPACITY: usize = 16;

fn metadata_value<T>(request: &Request<T>, key: &str) -> String {
    request
        .metadata()
        .get(key)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

#[tonic::async_trait]
impl proto::authn::v1::authentication_server::Authentication for ScafGrpc {
    async fn create_token(
        &self,
        request: Request<proto::authn::v1::TokenRequest>,
    ) -> Result<Response<proto::authn::v1::TokenRequest>, Status> {
        info!(req_id = %request_id(&request), request = "CreateToken", "request received");
        let req = convert::token_request_from_proto(request.into_inner());
        let resp = self.state.authn.create_token(req).map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::token_request_to_proto(resp)))
    }

    async fn create_self_subject_review(
        &self,
        request: Request<proto::authn::v1::SelfSubjectReview>,
    ) -> Result<Response<proto::authn::v1::SelfSubjectReview>, Status> {
        info!(
            req_id = %request_id(&request),
            request = "CreateSelfSubjectReview",
            "request received"
        );
        let token = metadata_token(&request);
        let resp = self
            .state
            .authn
            .create_self_subject_review(token.as_deref())
            .map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::self_subject_review_to_proto(resp)))
    }
}

#[tonic::async_trait]
impl proto::stream::v1::streams_server::Streams for ScafGrpc {
    async fn create_stream(
        &self,
        request: Request<proto::stream::v1::Stream>,
    ) -> Result<Response<proto::stream::v1::Stream>, Status> {
        info!(req_id = %request_id(&request), request = "CreateStream", "request received");
        let token = metadata_token(&request);
        let stream = convert::stream_from_proto(request.into_inner())?;
        let resp = self
            .state
            .streams
            .create_stream(token.as_deref(), stream)
            .await
            .map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::stream_to_proto(resp)))
    }

    async fn get_stream(
        &self,
        request: Request<proto::stream::v1::GetStreamRequest>,
    ) -> Result<Response<proto::stream::v1::Stream>, Status> {
        let name = request.get_ref().name.clone();
        info!(
            req_id = %request_id(&request),
            request = "GetStream",
            stream = %name,
            "request received"
        );
        let token = metadata_token(&request);
        let resp = self
            .state
            .streams
            .get_stream(token.as_deref(), &name)
            .await
            .map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::stream_to_proto(resp)))
    }

    async fn list_streams(
        &self,
        request: Request<proto::stream::v1::ListStreamsRequest>,
    ) -> Result<Response<proto::stream::v1::StreamList>, Status> {
        info!(req_id = %request_id(&request), request = "ListStreams", "request received");
        let token = metadata_token(&request);
        let resp = self
            .state
            .streams
            .list_streams(token.as_deref())
            .await
            .map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::stream_list_to_proto(resp)))
    }

    async fn delete_stream(
        &self,
        request: Request<proto::stream::v1::DeleteStreamRequest>,
    ) -> Result<Response<proto::meta::v1::Status>, Status> {
        let name = request.get_ref().name.clone();
        info!(
            req_id = %request_id(&request),
            request = "DeleteStream",
            stream = %name,
            "request received"
        );
        let token = metadata_token(&request);
        self.state
            .streams
            .delete_stream(token.as_deref(), &name)
            .await
            .map_err(|err| err.to_grpc_status())?;
        Ok(Response::new(convert::status_to_proto(crate::api::meta::Status::ok())))
    }

    type ConnectStreamStream = GrpcStream<proto::stream::v1::Package>;

    async fn connect_stream(
        &self,
        request: Request<Streaming<proto::stream::v1::Package>>,
    ) -> Result<Response<Self::ConnectStreamStream>, Status> {
        let stream_name = metadata_value(&request, METADATA_KEY_STREAM_NAME);
        let conn_name = metadata_value(&request, METADATA_KEY_CONNECTION_NAME);
        info!(
            req_id = %request_id(&request),
            request = "ConnectStream",
            stream = %stream_name,
            conn = %conn_name,
            "request received"
        );
        let token = metadata_token(&request);

        let instance = self
            .state
            .streams
            .get_stream_instance(token.as_deref(), &stream_name)
            .await
            .map_err(|err| err.to_grpc_status())?;

        let inbound = request.into_inner();
        let (outbound, rx) = mpsc::channel(OUTBOUND_CHANNEL_CAPACITY);
        let conn = Arc::new(GrpcServerConnection::new(conn_name, inbound, outbound));
        let done = conn.done();
        let logged: Arc<dyn Connection> = Arc::new(ConnectionWithLog::new(conn));

        if let Err(err) = instance.stream.join(logged).await {
            warn!(stream = %stream_name, "join stream error: {err}");
            return Err(ApiError::internal(format!("join stream error: {err}")).to_grpc_status());
        }

        // The response stream ends when the connection is closed, which
        // terminates the RPC even if the client keeps its half open.
        let out = ReceiverStream::new(rx).take_until(done.cancelled_owned());
        Ok(Response::new(Box::pin(out)))
    }
}
