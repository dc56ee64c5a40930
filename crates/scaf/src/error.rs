// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::meta::Status;

/// Canonical reasons carried in API error bodies, shared by the HTTP and
/// gRPC front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    InternalServerError,
}

impl Reason {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
        }
    }

    pub fn grpc_code(&self) -> tonic::Code {
        match self {
            Self::BadRequest => tonic::Code::InvalidArgument,
            Self::Unauthorized => tonic::Code::Unauthenticated,
            Self::Forbidden => tonic::Code::PermissionDenied,
            Self::NotFound => tonic::Code::NotFound,
            Self::InternalServerError => tonic::Code::Internal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::InternalServerError => "InternalServerError",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An API error: a canonical reason plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub reason: Reason,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { reason: Reason::BadRequest, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self { reason: Reason::Unauthorized, message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self { reason: Reason::Forbidden, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { reason: Reason::NotFound, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { reason: Reason::InternalServerError, message: message.into() }
    }

    /// The `{code, reason, message}` body serialized on the wire.
    pub fn to_status_body(&self) -> Status {
        Status {
            code: i32::from(self.reason.http_status()),
            reason: self.reason.as_str().to_owned(),
            message: self.message.clone(),
        }
    }

    /// Convert into a [`tonic::Status`] with the structured body attached
    /// as a detail.
    pub fn to_grpc_status(&self) -> tonic::Status {
        let detail = crate::api::proto::meta::v1::Status {
            code: i32::from(self.reason.http_status()),
            reason: self.reason.as_str().to_owned(),
            message: self.message.clone(),
        };
        tonic::Status::with_details(
            self.reason.grpc_code(),
            self.to_string(),
            prost::Message::encode_to_vec(&detail).into(),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}): {}", self.reason, self.reason.http_status(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.reason.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_status_body())).into_response()
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
