// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport-agnostic request handlers shared by the HTTP and gRPC front
//! ends. Authorization lives here; the transports only move tokens and
//! bodies.

pub mod authn;
pub mod streams;

pub use authn::AuthenticationServer;
pub use streams::StreamsServer;

use crate::auth::{users, TokenAuthenticator};
use crate::error::ApiError;

/// Resolve the caller's principal from an optional bearer token. No token
/// means anonymous; an invalid token is an authentication failure.
fn resolve_principal(
    authenticator: &TokenAuthenticator,
    token: Option<&str>,
) -> Result<String, ApiError> {
    match token {
        None | Some("") => Ok(users::ANONYMOUS_USERNAME.to_owned()),
        Some(token) => authenticator
            .authenticate(token)
            .map_err(|err| ApiError::unauthorized(format!("invalid token: {err}"))),
    }
}
