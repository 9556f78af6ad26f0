//! Persistence seam for identity, sessions, profiles, and tenants.
//!
//! ARCHITECTURE
//! ============
//! Everything the service needs from its backing store goes through the
//! [`AuthStore`] trait. `PgStore` talks to Postgres via SQLx; `MemoryStore`
//! keeps the same contract in process for tests and database-less dev runs.
//! Services only ever see `&dyn AuthStore`.

pub mod memory;
pub mod postgres;

use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::services::role::Role;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Purpose of a one-time auth token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    PhoneLogin,
    PasswordReset,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhoneLogin => "phone_login",
            Self::PasswordReset => "password_reset",
        }
    }
}

/// Account row plus the metadata captured at sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub phone: Option<&'a str>,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// What a valid session token resolves to, before role parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: Uuid,
    pub email: String,
    pub roles: Vec<String>,
    pub tenant_id: Option<Uuid>,
}

/// Persisted user profile. One per user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[async_trait::async_trait]
pub trait AuthStore: Send + Sync {
    /// Create an account. Fails with [`StoreError::Conflict`] on a taken email or phone.
    async fn create_user(&self, user: NewUser<'_>) -> Result<Uuid, StoreError>;

    /// Return the user id when the email/password pair matches.
    async fn verify_password(&self, email: &str, password: &str) -> Result<Option<Uuid>, StoreError>;

    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), StoreError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError>;

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<Uuid>, StoreError>;

    async fn insert_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<(), StoreError>;

    /// Resolve an unexpired session token.
    async fn load_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn delete_session(&self, token: &str) -> Result<(), StoreError>;

    /// Store a hashed one-time token, revoking the user's earlier tokens of the same kind.
    async fn insert_auth_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Atomically remove an unexpired token of `kind`, returning its owner.
    async fn consume_auth_token(&self, token_hash: &str, kind: TokenKind) -> Result<Option<Uuid>, StoreError>;

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError>;

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError>;

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError>;
}
