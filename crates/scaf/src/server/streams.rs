// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::stream::{Stream, StreamList, StreamStatus};
use crate::auth::{users, TokenAuthenticator};
use crate::error::ApiError;
use crate::streams::{StreamError, StreamInstance, StreamManager};

use super::resolve_principal;

/// Generic streams service enforcing the authorization table.
pub struct StreamsServer {
    authenticator: Arc<TokenAuthenticator>,
    manager: Arc<StreamManager>,
}

impl StreamsServer {
    pub fn new(authenticator: Arc<TokenAuthenticator>, manager: Arc<StreamManager>) -> Self {
        Self { authenticator, manager }
    }

    /// Create a stream. Any caller may create; a non-anonymous caller is
    /// appended to the owners. The response carries a freshly minted
    /// stream-scoped token.
    pub async fn create_stream(
        &self,
        token: Option<&str>,
        mut stream: Stream,
    ) -> Result<Stream, ApiError> {
        let username = resolve_principal(&self.authenticator, token)?;
        if !users::is_anonymous(&username) && !users::is_owner(&username, &stream.metadata) {
            stream.metadata.owners.push(username.clone());
        }
        // Status is server-owned.
        stream.status = StreamStatus::default();

        let instance = self.manager.create_stream(stream).await.map_err(|err| {
            warn!("create stream error: {err}");
            ApiError::internal(format!("create stream error: {err}"))
        })?;

        let mut object = instance.object;
        object.status.token = self
            .authenticator
            .issue(&users::stream_username(&object.metadata.name), None)
            .map_err(|err| {
                warn!("issue stream token error: {err}");
                ApiError::internal(format!("issue stream token error: {err}"))
            })?;
        Ok(object)
    }

    pub async fn get_stream(&self, token: Option<&str>, name: &str) -> Result<Stream, ApiError> {
        Ok(self.get_stream_instance(token, name).await?.object)
    }

    /// Fetch the registry entry after enforcing read access. Used by the
    /// CRUD surface and by the transports' join paths.
    pub async fn get_stream_instance(
        &self,
        token: Option<&str>,
        name: &str,
    ) -> Result<StreamInstance, ApiError> {
        let username = resolve_principal(&self.authenticator, token)?;
        if users::is_anonymous(&username) {
            return Err(not_allowed(&username, "get", name));
        }
        let instance =
            self.manager.get_stream(name).await.map_err(|err| manager_error(name, err))?;
        if !users::is_stream(&username, name)
            && !users::is_owner(&username, &instance.object.metadata)
            && !users::is_admin(&username)
        {
            return Err(not_allowed(&username, "get", name));
        }
        Ok(instance)
    }

    /// List streams visible to the caller: everything for the admin, owned
    /// streams for ordinary users.
    pub async fn list_streams(&self, token: Option<&str>) -> Result<StreamList, ApiError> {
        let username = resolve_principal(&self.authenticator, token)?;
        if users::is_anonymous(&username) || users::is_streams(&username) {
            let err =
                ApiError::forbidden(format!("user {username:?} is not allowed to list streams"));
            info!("{err}");
            return Err(err);
        }
        let items = self
            .manager
            .list_streams()
            .await
            .into_iter()
            .filter(|ins| {
                users::is_owner(&username, &ins.object.metadata) || users::is_admin(&username)
            })
            .map(|ins| ins.object)
            .collect();
        Ok(StreamList { items })
    }

    pub async fn delete_stream(&self, token: Option<&str>, name: &str) -> Result<(), ApiError> {
        let username = resolve_principal(&self.authenticator, token)?;
        if users::is_anonymous(&username) {
            return Err(not_allowed(&username, "delete", name));
        }
        if !users::is_admin(&username) && !users::is_stream(&username, name) {
            let instance =
                self.manager.get_stream(name).await.map_err(|err| manager_error(name, err))?;
            if !users::is_owner(&username, &instance.object.metadata) {
                return Err(not_allowed(&username, "delete", name));
            }
        }
        self.manager.delete_stream(name).await.map_err(|err| manager_error(name, err))
    }
}

fn not_allowed(username: &str, verb: &str, name: &str) -> ApiError {
    let err = ApiError::forbidden(format!(
        "user {username:?} is not allowed to {verb} stream {name:?}"
    ));
    info!("{err}");
    err
}

fn manager_error(name: &str, err: StreamError) -> ApiError {
    match err {
        StreamError::NotFound => ApiError::not_found(format!("stream {name:?} not found")),
        other => ApiError::internal(format!("stream {name:?}: {other}")),
    }
}

#[cfg(test)]
#[path = "streams_tests.rs"]
mod tests;
