// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Principal helpers. Principals are plain strings namespaced by prefix.

use rand::Rng;

use crate::api::meta::ObjectMeta;

pub const ADMIN_USERNAME: &str = "system:admin";
pub const ANONYMOUS_USERNAME: &str = "system:anonymous";
pub const STREAM_USERNAME_PREFIX: &str = "system:stream:";
pub const NORMAL_USERNAME_PREFIX: &str = "user:";

const RAND_USERNAME_LEN: usize = 16;
const LOWER_ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Whether the user is the administrator.
pub fn is_admin(username: &str) -> bool {
    username == ADMIN_USERNAME
}

/// Whether the user is unauthenticated.
pub fn is_anonymous(username: &str) -> bool {
    username == ANONYMOUS_USERNAME
}

/// Whether the user is any stream-scoped principal.
pub fn is_streams(username: &str) -> bool {
    username.starts_with(STREAM_USERNAME_PREFIX)
}

/// Whether the user is the principal scoped to `stream_name`.
pub fn is_stream(username: &str, stream_name: &str) -> bool {
    username == stream_username(stream_name)
}

/// Whether the user is listed among the object's owners.
pub fn is_owner(username: &str, meta: &ObjectMeta) -> bool {
    meta.owners.iter().any(|owner| owner == username)
}

/// The principal scoped to `stream_name`.
pub fn stream_username(stream_name: &str) -> String {
    format!("{STREAM_USERNAME_PREFIX}{stream_name}")
}

/// Generate a random ordinary-user principal.
pub fn rand_normal_username() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..RAND_USERNAME_LEN)
        .map(|_| LOWER_ALPHANUMERIC[rng.random_range(0..LOWER_ALPHANUMERIC.len())] as char)
        .collect();
    format!("{NORMAL_USERNAME_PREFIX}{suffix}")
}

#[cfg(test)]
#[path = "users_tests.rs"]
mod tests;
