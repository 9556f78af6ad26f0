//! In-process [`AuthStore`] for tests and database-less dev runs.
//!
//! All state sits behind one `std::sync::Mutex`; no lock is held across an
//! `.await`. Passwords are salted SHA-256, which is fine for a store that
//! never outlives the process.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{AuthStore, NewUser, Profile, SessionRecord, StoreError, TokenKind, UserRecord};
use crate::services::session::{bytes_to_hex, generate_token};

struct StoredUser {
    record: UserRecord,
    salt: String,
    password_hash: String,
}

#[derive(Default)]
struct MemoryInner {
    users: HashMap<Uuid, StoredUser>,
    sessions: HashMap<String, (Uuid, Instant)>,
    tokens: HashMap<String, (Uuid, TokenKind, Instant)>,
    profiles: HashMap<Uuid, Profile>,
    extra_roles: HashMap<Uuid, Vec<String>>,
    tenants: HashMap<String, Uuid>,
    memberships: HashMap<Uuid, Uuid>,
    failing: bool,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

/// Expiry instant for `ttl` from now, saturating far in the future.
fn deadline(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the locked state, or fail when the store is marked down.
    fn with<T>(&self, f: impl FnOnce(&mut MemoryInner) -> Result<T, StoreError>) -> Result<T, StoreError> {
        let mut inner = self
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if inner.failing {
            return Err(StoreError::Unavailable("memory store marked as failing".into()));
        }
        f(&mut inner)
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_failing(&self, failing: bool) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .failing = failing;
    }

    pub fn seed_tenant(&self, subdomain: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tenants
            .insert(subdomain.to_owned(), id);
        id
    }

    pub fn add_member(&self, tenant_id: Uuid, user_id: Uuid) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .memberships
            .insert(user_id, tenant_id);
    }

    pub fn grant_role(&self, user_id: Uuid, role: &str) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extra_roles
            .entry(user_id)
            .or_default()
            .push(role.to_owned());
    }

    pub fn profile_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .profiles
            .len()
    }

    pub fn session_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sessions
            .len()
    }

    pub fn token_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .tokens
            .len()
    }
}

#[async_trait::async_trait]
impl AuthStore for MemoryStore {
    async fn create_user(&self, user: NewUser<'_>) -> Result<Uuid, StoreError> {
        self.with(|inner| {
            if inner.users.values().any(|u| u.record.email == user.email) {
                return Err(StoreError::Conflict("email"));
            }
            if let Some(phone) = user.phone {
                if inner
                    .users
                    .values()
                    .any(|u| u.record.phone.as_deref() == Some(phone))
                {
                    return Err(StoreError::Conflict("phone"));
                }
            }
            let id = Uuid::new_v4();
            let salt = generate_token();
            let password_hash = hash_password(&salt, user.password);
            let record = UserRecord {
                id,
                email: user.email.to_owned(),
                phone: user.phone.map(str::to_owned),
                first_name: user.first_name.to_owned(),
                last_name: user.last_name.to_owned(),
            };
            inner.users.insert(id, StoredUser { record, salt, password_hash });
            Ok(id)
        })
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<Option<Uuid>, StoreError> {
        self.with(|inner| {
            Ok(inner
                .users
                .values()
                .find(|u| u.record.email == email && u.password_hash == hash_password(&u.salt, password))
                .map(|u| u.record.id))
        })
    }

    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), StoreError> {
        self.with(|inner| {
            if let Some(user) = inner.users.get_mut(&user_id) {
                user.salt = generate_token();
                user.password_hash = hash_password(&user.salt, password);
            }
            Ok(())
        })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        self.with(|inner| Ok(inner.users.get(&user_id).map(|u| u.record.clone())))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError> {
        self.with(|inner| {
            Ok(inner
                .users
                .values()
                .find(|u| u.record.email == email)
                .map(|u| u.record.id))
        })
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<Uuid>, StoreError> {
        self.with(|inner| {
            Ok(inner
                .users
                .values()
                .find(|u| u.record.phone.as_deref() == Some(phone))
                .map(|u| u.record.id))
        })
    }

    async fn insert_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        self.with(|inner| {
            let now = Instant::now();
            inner.sessions.retain(|_, (_, expires_at)| *expires_at > now);
            inner
                .sessions
                .insert(token.to_owned(), (user_id, deadline(now, ttl)));
            Ok(())
        })
    }

    async fn load_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        self.with(|inner| {
            let Some(&(user_id, expires_at)) = inner.sessions.get(token) else {
                return Ok(None);
            };
            if expires_at <= Instant::now() {
                inner.sessions.remove(token);
                return Ok(None);
            }
            let Some(user) = inner.users.get(&user_id) else {
                return Ok(None);
            };

            let mut roles = inner
                .extra_roles
                .get(&user_id)
                .cloned()
                .unwrap_or_default();
            if let Some(profile) = inner.profiles.get(&user_id) {
                roles.push(profile.role.as_str().to_owned());
            }

            Ok(Some(SessionRecord {
                user_id,
                email: user.record.email.clone(),
                roles,
                tenant_id: inner.memberships.get(&user_id).copied(),
            }))
        })
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        self.with(|inner| {
            inner.sessions.remove(token);
            Ok(())
        })
    }

    async fn insert_auth_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.with(|inner| {
            let now = Instant::now();
            inner
                .tokens
                .retain(|_, (owner, k, expires_at)| *expires_at > now && !(*owner == user_id && *k == kind));
            inner
                .tokens
                .insert(token_hash.to_owned(), (user_id, kind, deadline(now, ttl)));
            Ok(())
        })
    }

    async fn consume_auth_token(&self, token_hash: &str, kind: TokenKind) -> Result<Option<Uuid>, StoreError> {
        self.with(|inner| {
            match inner.tokens.get(token_hash) {
                Some(&(_, k, _)) if k != kind => return Ok(None),
                None => return Ok(None),
                Some(_) => {}
            }
            let Some((user_id, _, expires_at)) = inner.tokens.remove(token_hash) else {
                return Ok(None);
            };
            Ok((expires_at > Instant::now()).then_some(user_id))
        })
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        self.with(|inner| Ok(inner.profiles.get(&user_id).cloned()))
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.with(|inner| {
            inner
                .profiles
                .entry(profile.id)
                .or_insert_with(|| profile.clone());
            Ok(())
        })
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        self.with(|inner| {
            if let Some(existing) = inner.profiles.get_mut(&profile.id) {
                existing.email.clone_from(&profile.email);
                existing.first_name.clone_from(&profile.first_name);
                existing.last_name.clone_from(&profile.last_name);
                existing.updated_at = profile.updated_at;
            }
            Ok(())
        })
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError> {
        self.with(|inner| Ok(inner.tenants.contains_key(subdomain)))
    }
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
