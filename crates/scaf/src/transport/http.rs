// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON handlers for the HTTP front end.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::authn::{SelfSubjectReview, TokenRequest};
use crate::api::meta::Status;
use crate::api::stream::Stream;
use crate::error::ApiError;

use super::auth::BearerToken;
use super::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub streams: usize,
}

/// Decode an optional JSON body: a request without one yields the default,
/// a malformed one is a client error.
fn optional_body<T: Default>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => {
            Err(ApiError::bad_request(format!("invalid request body: {rejection}")))
        }
    }
}

/// `GET /healthz`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let streams = state.manager.list_streams().await.len();
    Json(HealthResponse { status: "running".to_owned(), streams })
}

/// `POST /v1/tokens` — mint a token for a fresh random user. The request
/// body is accepted for shape but its contents are server-owned.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> impl IntoResponse {
    let req = match optional_body(body) {
        Ok(req) => req,
        Err(err) => return err.into_response(),
    };
    match state.authn.create_token(req) {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `POST /v1/selfsubjectreviews` — report the caller's principal.
pub async fn create_self_subject_review(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<BearerToken>,
    body: Result<Json<SelfSubjectReview>, JsonRejection>,
) -> impl IntoResponse {
    if let Err(err) = optional_body(body) {
        return err.into_response();
    }
    match state.authn.create_self_subject_review(token.as_deref()) {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `POST /v1/streams`
pub async fn create_stream(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<BearerToken>,
    body: Result<Json<Stream>, JsonRejection>,
) -> impl IntoResponse {
    let Json(stream) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return ApiError::bad_request(format!("invalid request body: {rejection}"))
                .into_response()
        }
    };
    match state.streams.create_stream(token.as_deref(), stream).await {
        Ok(resp) => (StatusCode::CREATED, Json(resp)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `GET /v1/streams`
pub async fn list_streams(
    State(state): State<Arc<AppState>>,
    Extension(token): Extension<BearerToken>,
) -> impl IntoResponse {
    match state.streams.list_streams(token.as_deref()).await {
        Ok(resp) => Json(resp).into_response(),
        Err(err) => err.into_response(),
    }
}

/// `DELETE /v1/streams/{name}`
pub async fn delete_stream(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Extension(token): Extension<BearerToken>,
) -> impl IntoResponse {
    match state.streams.delete_stream(token.as_deref(), &name).await {
        Ok(()) => Json(Status::ok()).into_response(),
        Err(err) => err.into_response(),
    }
}
