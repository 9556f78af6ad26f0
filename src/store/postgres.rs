//! Postgres-backed [`AuthStore`].
//!
//! Passwords are hashed inside the database with pgcrypto's bcrypt
//! (`crypt(.., gen_salt('bf'))`), so plaintext never lands in a column.
//! One-time tokens are consumed with `DELETE ... RETURNING` to guarantee
//! single use. Expired sessions and tokens are pruned whenever a new one is
//! inserted.

use std::time::Duration;

use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{AuthStore, NewUser, Profile, SessionRecord, StoreError, TokenKind, UserRecord};
use crate::services::role::{DEFAULT_ROLE, Role};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_unique_violation(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("phone") => "phone",
                _ => "email",
            };
            return StoreError::Conflict(field);
        }
    }
    StoreError::Db(err)
}

fn parse_stored_role(raw: &str) -> Role {
    raw.parse().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "profile has unknown role; using default");
        DEFAULT_ROLE
    })
}

#[async_trait::async_trait]
impl AuthStore for PgStore {
    async fn create_user(&self, user: NewUser<'_>) -> Result<Uuid, StoreError> {
        let row = sqlx::query(
            r"INSERT INTO users (email, phone, encrypted_password, first_name, last_name)
              VALUES ($1, $2, crypt($3, gen_salt('bf')), $4, $5)
              RETURNING id",
        )
        .bind(user.email)
        .bind(user.phone)
        .bind(user.password)
        .bind(user.first_name)
        .bind(user.last_name)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;
        Ok(row.get("id"))
    }

    async fn verify_password(&self, email: &str, password: &str) -> Result<Option<Uuid>, StoreError> {
        let row = sqlx::query(
            "SELECT id FROM users WHERE email = $1 AND encrypted_password = crypt($2, encrypted_password)",
        )
        .bind(email)
        .bind(password)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn set_password(&self, user_id: Uuid, password: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET encrypted_password = crypt($2, gen_salt('bf')) WHERE id = $1")
            .bind(user_id)
            .bind(password)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query("SELECT id, email, phone, first_name, last_name FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| UserRecord {
            id: r.get("id"),
            email: r.get("email"),
            phone: r.get("phone"),
            first_name: r.get("first_name"),
            last_name: r.get("last_name"),
        }))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_user_by_phone(&self, phone: &str) -> Result<Option<Uuid>, StoreError> {
        let id = sqlx::query_scalar("SELECT id FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    async fn insert_session(&self, token: &str, user_id: Uuid, ttl: Duration) -> Result<(), StoreError> {
        let pruned = sqlx::query("DELETE FROM sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await?
            .rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "expired sessions removed");
        }
        sqlx::query(
            "INSERT INTO sessions (token, user_id, expires_at) VALUES ($1, $2, now() + make_interval(secs => $3))",
        )
        .bind(token)
        .bind(user_id)
        .bind(ttl.as_secs_f64())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_session(&self, token: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query(
            r"SELECT
                  u.id,
                  u.email,
                  p.role AS primary_role,
                  ARRAY(SELECT r.role FROM user_roles r WHERE r.user_id = u.id) AS roles,
                  (SELECT m.tenant_id
                     FROM tenant_members m
                    WHERE m.user_id = u.id
                    ORDER BY m.created_at
                    LIMIT 1) AS tenant_id
              FROM sessions s
              JOIN users u ON u.id = s.user_id
              LEFT JOIN profiles p ON p.id = u.id
              WHERE s.token = $1 AND s.expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let mut roles: Vec<String> = r.get("roles");
            if let Some(primary) = r.get::<Option<String>, _>("primary_role") {
                roles.push(primary);
            }
            SessionRecord { user_id: r.get("id"), email: r.get("email"), roles, tenant_id: r.get("tenant_id") }
        }))
    }

    async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_auth_token(
        &self,
        token_hash: &str,
        user_id: Uuid,
        kind: TokenKind,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM auth_tokens WHERE (user_id = $1 AND kind = $2) OR expires_at <= now()")
            .bind(user_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r"INSERT INTO auth_tokens (token_hash, user_id, kind, expires_at)
              VALUES ($1, $2, $3, now() + make_interval(secs => $4))",
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(ttl.as_secs_f64())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn consume_auth_token(&self, token_hash: &str, kind: TokenKind) -> Result<Option<Uuid>, StoreError> {
        let row = sqlx::query(
            "DELETE FROM auth_tokens WHERE token_hash = $1 AND kind = $2 AND expires_at > now() RETURNING user_id",
        )
        .bind(token_hash)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("user_id")))
    }

    async fn get_profile(&self, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
        let row = sqlx::query("SELECT id, email, first_name, last_name, role, updated_at FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| Profile {
            id: r.get("id"),
            email: r.get("email"),
            first_name: r.get("first_name"),
            last_name: r.get("last_name"),
            role: parse_stored_role(r.get("role")),
            updated_at: r.get("updated_at"),
        }))
    }

    async fn insert_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        // A racing insert for the same id leaves the first writer's row.
        sqlx::query(
            r"INSERT INTO profiles (id, email, first_name, last_name, role, updated_at)
              VALUES ($1, $2, $3, $4, $5, $6)
              ON CONFLICT (id) DO NOTHING",
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.role.as_str())
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        sqlx::query(
            r"UPDATE profiles
              SET email = $2, first_name = $3, last_name = $4, updated_at = $5
              WHERE id = $1",
        )
        .bind(profile.id)
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(profile.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn subdomain_exists(&self, subdomain: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tenants WHERE subdomain = $1)")
            .bind(subdomain)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}

#[cfg(all(test, feature = "live-db-tests"))]
#[path = "postgres_test.rs"]
mod tests;
