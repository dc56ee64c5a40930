// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use crate::api::authn::{
    SelfSubjectReview, SelfSubjectReviewStatus, TokenRequest, TokenRequestStatus, UserInfo,
};
use crate::api::meta::ObjectMeta;
use crate::auth::{users, TokenAuthenticator};
use crate::error::ApiError;

use super::resolve_principal;

/// Generic authentication service.
pub struct AuthenticationServer {
    authenticator: Arc<TokenAuthenticator>,
}

impl AuthenticationServer {
    pub fn new(authenticator: Arc<TokenAuthenticator>) -> Self {
        Self { authenticator }
    }

    /// Mint a never-expiring token for a fresh random user. Anonymous
    /// callers are permitted — this is how anonymous becomes authenticated.
    pub fn create_token(&self, _req: TokenRequest) -> Result<TokenRequest, ApiError> {
        let username = users::rand_normal_username();
        let token = self.authenticator.issue(&username, None).map_err(|err| {
            warn!("issue token error: {err}");
            ApiError::internal(format!("issue token error: {err}"))
        })?;
        Ok(TokenRequest {
            metadata: ObjectMeta {
                name: username,
                uid: Uuid::new_v4().to_string(),
                ..Default::default()
            },
            status: TokenRequestStatus { token },
        })
    }

    /// Report the caller's authenticated principal.
    pub fn create_self_subject_review(
        &self,
        token: Option<&str>,
    ) -> Result<SelfSubjectReview, ApiError> {
        let username = resolve_principal(&self.authenticator, token)?;
        if users::is_anonymous(&username) {
            return Err(ApiError::unauthorized("not authenticated"));
        }
        Ok(SelfSubjectReview {
            metadata: ObjectMeta::default(),
            status: SelfSubjectReviewStatus { user_info: UserInfo { username } },
        })
    }
}
