//! Email/password accounts, phone-login links, and password resets.
//!
//! Link delivery is a console transport: the callback URL is written to the
//! log instead of being sent by SMS or email. Requests for unknown emails or
//! phone numbers succeed silently so callers cannot enumerate accounts.

use std::time::Duration;

use serde::Deserialize;
use url::form_urlencoded;
use uuid::Uuid;

use super::profile::{self, ProfileInput};
use super::session::{generate_token, hash_token};
use crate::config::AppConfig;
use crate::store::{AuthStore, NewUser, StoreError, TokenKind};

pub const MIN_PASSWORD_LEN: usize = 8;
pub const PHONE_CALLBACK_PATH: &str = "/auth/phone/callback";
pub const RESET_CALLBACK_PATH: &str = "/auth/reset/callback";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email")]
    InvalidEmail,
    #[error("invalid phone number")]
    InvalidPhone,
    #[error("password must be at least {} characters", MIN_PASSWORD_LEN)]
    WeakPassword,
    #[error("{0} is already registered")]
    AlreadyRegistered(&'static str),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(field) => Self::AlreadyRegistered(field),
            other => Self::Store(other),
        }
    }
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    let (local, domain) = normalized.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some(normalized)
}

/// Strip formatting characters, keeping an optional leading `+` and digits.
#[must_use]
pub fn normalize_phone(phone: &str) -> Option<String> {
    let trimmed = phone.trim();
    let (plus, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };
    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '(' | ')' | '.' => {}
            _ => return None,
        }
    }
    if digits.is_empty() {
        return None;
    }
    Some(format!("{plus}{digits}"))
}

fn check_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Create an account and its profile. Returns the new user id.
pub async fn sign_up(store: &dyn AuthStore, input: &SignUp) -> Result<Uuid, AuthError> {
    let email = normalize_email(&input.email).ok_or(AuthError::InvalidEmail)?;
    let phone = match input.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        Some(raw) => Some(normalize_phone(raw).ok_or(AuthError::InvalidPhone)?),
        None => None,
    };
    check_password(&input.password)?;

    let first_name = input.first_name.trim();
    let last_name = input.last_name.trim();
    let user_id = store
        .create_user(NewUser { email: &email, password: &input.password, phone: phone.as_deref(), first_name, last_name })
        .await?;

    profile::upsert_profile(
        store,
        &ProfileInput { user_id, email, first_name: first_name.to_owned(), last_name: last_name.to_owned() },
    )
    .await?;

    tracing::info!(%user_id, "account created");
    Ok(user_id)
}

/// Verify credentials and refresh the profile. Returns the user id.
pub async fn sign_in(store: &dyn AuthStore, email: &str, password: &str) -> Result<Uuid, AuthError> {
    let email = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;
    let user_id = store
        .verify_password(&email, password)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    profile::refresh_after_login(store, user_id).await?;
    Ok(user_id)
}

pub async fn update_password(store: &dyn AuthStore, user_id: Uuid, password: &str) -> Result<(), AuthError> {
    check_password(password)?;
    store.set_password(user_id, password).await?;
    tracing::info!(%user_id, "password updated");
    Ok(())
}

/// Issue a one-time token of `kind` for `user_id`. Only its hash is stored.
pub async fn issue_token(
    store: &dyn AuthStore,
    user_id: Uuid,
    kind: TokenKind,
    ttl: Duration,
) -> Result<String, StoreError> {
    let token = generate_token();
    store
        .insert_auth_token(&hash_token(&token), user_id, kind, ttl)
        .await?;
    Ok(token)
}

fn callback_link(config: &AppConfig, path: &str, token: &str) -> String {
    let query: String = form_urlencoded::Serializer::new(String::new())
        .append_pair("token", token)
        .finish();
    config.link(&format!("{path}?{query}"))
}

fn deliver_link(kind: TokenKind, recipient: &str, link: &str) {
    tracing::info!(kind = kind.as_str(), recipient, link, "console delivery: one-time sign-in link");
}

/// Send a phone-login link when `phone` belongs to an account.
///
/// Returns the delivered link, or `None` when nothing was sent.
pub async fn request_phone_login(
    store: &dyn AuthStore,
    config: &AppConfig,
    phone: &str,
) -> Result<Option<String>, AuthError> {
    let phone = normalize_phone(phone).ok_or(AuthError::InvalidPhone)?;
    let Some(user_id) = store.find_user_by_phone(&phone).await? else {
        tracing::debug!("phone login requested for unknown number");
        return Ok(None);
    };
    let token = issue_token(store, user_id, TokenKind::PhoneLogin, config.auth_token_ttl).await?;
    let link = callback_link(config, PHONE_CALLBACK_PATH, &token);
    deliver_link(TokenKind::PhoneLogin, &phone, &link);
    Ok(Some(link))
}

/// Send a password-reset link when `email` belongs to an account.
///
/// Returns the delivered link, or `None` when nothing was sent.
pub async fn request_password_reset(
    store: &dyn AuthStore,
    config: &AppConfig,
    email: &str,
) -> Result<Option<String>, AuthError> {
    let Some(email) = normalize_email(email) else {
        return Ok(None);
    };
    let Some(user_id) = store.find_user_by_email(&email).await? else {
        tracing::debug!("password reset requested for unknown email");
        return Ok(None);
    };
    let token = issue_token(store, user_id, TokenKind::PasswordReset, config.auth_token_ttl).await?;
    let link = callback_link(config, RESET_CALLBACK_PATH, &token);
    deliver_link(TokenKind::PasswordReset, &email, &link);
    Ok(Some(link))
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
