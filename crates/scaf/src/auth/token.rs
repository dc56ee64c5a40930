// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{
    decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Length of the generated signing key when none is configured.
const DEFAULT_SIGN_KEY_LEN: usize = 256;

/// Tokens are valid slightly before their issue time to tolerate clock skew
/// between the server and verifying parties.
const NOT_BEFORE_SKEW: Duration = Duration::from_secs(5 * 60);

/// Registered claims carried by scaf tokens.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    iss: String,
    sub: String,
    iat: u64,
    nbf: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<u64>,
}

/// Signs and verifies opaque bearer tokens binding a subject.
///
/// Verification is stateless: any token signed with the instance's symmetric
/// key is accepted, so key rotation means restart. When no key is configured
/// a random one is generated, deliberately invalidating previously minted
/// tokens across restarts.
pub struct TokenAuthenticator {
    issuer: String,
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenAuthenticator {
    pub fn new(issuer: impl Into<String>, key: Option<Vec<u8>>) -> Self {
        let key = key.unwrap_or_else(|| {
            let mut buf = vec![0u8; DEFAULT_SIGN_KEY_LEN];
            rand::rng().fill_bytes(&mut buf);
            buf
        });
        Self {
            issuer: issuer.into(),
            encoding: EncodingKey::from_secret(&key),
            decoding: DecodingKey::from_secret(&key),
        }
    }

    /// Sign a token for `subject`. With `expire_after == None` the token
    /// never expires.
    pub fn issue(
        &self,
        subject: &str,
        expire_after: Option<Duration>,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = unix_now();
        let claims = Claims {
            iss: self.issuer.clone(),
            sub: subject.to_owned(),
            iat: now,
            nbf: now.saturating_sub(NOT_BEFORE_SKEW.as_secs()),
            exp: expire_after.map(|d| now + d.as_secs()),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
    }

    /// Verify signature and time claims, returning the token's subject.
    pub fn authenticate(&self, token: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = true;
        // `exp` is optional: tokens without it never expire.
        validation.required_spec_claims.clear();
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims.sub)
    }
}

fn unix_now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
