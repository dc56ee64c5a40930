// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use base64::Engine as _;

/// Configuration for the scaf server.
#[derive(Debug, Clone, clap::Args)]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(short = 'l', long = "listen", default_value = "0.0.0.0:9443", env = "SCAF_LISTEN")]
    pub listen: String,

    /// Issuer claim stamped into signed tokens.
    #[arg(long = "jwt-issuer", default_value = "scaf", env = "SCAF_JWT_ISSUER")]
    pub jwt_issuer: String,

    /// Token signing key, standard base64. When unset a random key is
    /// generated and tokens do not survive a restart.
    #[arg(long = "jwt-key", env = "SCAF_JWT_KEY")]
    pub jwt_key: Option<String>,
}

impl ServerConfig {
    /// Decode the configured signing key, if any.
    pub fn decoded_jwt_key(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        self.jwt_key
            .as_deref()
            .map(|key| base64::engine::general_purpose::STANDARD.decode(key))
            .transpose()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
