// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bearer-token extraction middleware.

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

/// Raw bearer token from the `Authorization` header, attached to request
/// extensions on every request. Principal resolution happens in the generic
/// servers.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(pub Option<String>);

impl BearerToken {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

/// Copy `Authorization: Bearer <token>` into request extensions so handlers
/// can resolve the caller's principal.
pub async fn bearer_layer(mut req: Request, next: Next) -> Response {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_owned);
    req.extensions_mut().insert(BearerToken(token));
    next.run(req).await
}
