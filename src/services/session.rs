//! Session client: token minting, resolution, and role/tenant queries.
//!
//! ARCHITECTURE
//! ============
//! Browsers hold an opaque random session token in an `HttpOnly` cookie. The
//! token resolves through the store into a [`Session`], which carries the
//! parsed role set and current tenant. Consumers only ever read a `Session`;
//! creating and ending one goes through this module.

use std::fmt::Write;
use std::time::Duration;

use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::role::{Role, RoleSet};
use crate::store::{AuthStore, StoreError};

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Generate a cryptographically random 32-byte hex token.
#[must_use]
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// SHA-256 hex digest of a one-time token. Only the digest is persisted.
#[must_use]
pub fn hash_token(token: &str) -> String {
    bytes_to_hex(&Sha256::digest(token.as_bytes()))
}

/// Authenticated identity with role and tenant claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub roles: RoleSet,
    pub current_tenant_id: Option<Uuid>,
}

impl Session {
    #[must_use]
    pub fn roles(&self) -> &RoleSet {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(role)
    }

    #[must_use]
    pub fn current_tenant(&self) -> Option<Uuid> {
        self.current_tenant_id
    }
}

/// Mint a new session for `user_id`, returning the cookie token.
pub async fn create_session(store: &dyn AuthStore, user_id: Uuid, ttl: Duration) -> Result<String, StoreError> {
    let token = generate_token();
    store.insert_session(&token, user_id, ttl).await?;
    tracing::info!(%user_id, "session created");
    Ok(token)
}

/// Resolve a session token into the current user, if it is still valid.
pub async fn current_user(store: &dyn AuthStore, token: &str) -> Result<Option<Session>, StoreError> {
    if token.is_empty() {
        return Ok(None);
    }
    let record = store.load_session(token).await?;
    Ok(record.map(|r| Session {
        user_id: r.user_id,
        email: r.email,
        roles: RoleSet::from_raw(r.roles),
        current_tenant_id: r.tenant_id,
    }))
}

/// Delete a session token. Unknown tokens are ignored.
pub async fn end_session(store: &dyn AuthStore, token: &str) -> Result<(), StoreError> {
    store.delete_session(token).await
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
