//! One-time token callbacks (phone login, password reset).
//!
//! A callback consumes its token exactly once and always ends in exactly one
//! redirect: the dashboard on success, the login page otherwise. The exchanged
//! token is never reused as a session credential; a fresh session token is
//! minted instead. Failures are reported to the user only through toasts.

use std::time::Duration;

use super::guard::{DASHBOARD_PATH, LOGIN_PATH};
use super::profile;
use super::session::{self, hash_token};
use super::toast::{NewToast, ToastStore};
use crate::store::{AuthStore, StoreError, TokenKind};

/// Destructive toasts stay up longer than the store default.
pub const FAILURE_TOAST_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub redirect: &'static str,
    /// Set only on success; the caller turns it into the session cookie.
    pub session_token: Option<String>,
}

impl CallbackOutcome {
    fn failed() -> Self {
        Self { redirect: LOGIN_PATH, session_token: None }
    }
}

fn flow_name(kind: TokenKind) -> &'static str {
    match kind {
        TokenKind::PhoneLogin => "Phone login",
        TokenKind::PasswordReset => "Password reset",
    }
}

fn success_toast(kind: TokenKind) -> NewToast {
    match kind {
        TokenKind::PhoneLogin => NewToast::success("Signed in", "You are now signed in."),
        TokenKind::PasswordReset => {
            NewToast::success("Link verified", "You are signed in. Choose a new password in settings.")
        }
    }
}

fn failure_toast(kind: TokenKind, description: &str) -> NewToast {
    NewToast::failure(format!("{} failed", flow_name(kind)), description).with_duration(FAILURE_TOAST_DURATION)
}

async fn redeem(
    store: &dyn AuthStore,
    kind: TokenKind,
    token: &str,
    session_ttl: Duration,
) -> Result<Option<String>, StoreError> {
    let Some(user_id) = store.consume_auth_token(&hash_token(token), kind).await? else {
        return Ok(None);
    };
    let session_token = session::create_session(store, user_id, session_ttl).await?;
    if let Err(e) = profile::refresh_after_login(store, user_id).await {
        tracing::warn!(%user_id, error = %e, "profile refresh after callback failed");
    }
    Ok(Some(session_token))
}

/// Exchange a one-time `token` of `kind` for a new session.
pub async fn exchange(
    store: &dyn AuthStore,
    toasts: &ToastStore,
    channel: &str,
    kind: TokenKind,
    token: Option<&str>,
    session_ttl: Duration,
) -> CallbackOutcome {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        tracing::info!(kind = kind.as_str(), "callback without token");
        toasts.add(channel, failure_toast(kind, "The link is missing its token."));
        return CallbackOutcome::failed();
    };

    let pending = toasts.add(channel, NewToast::info("Verifying link", ""));
    let result = redeem(store, kind, token, session_ttl).await;
    pending.dismiss();

    match result {
        Ok(Some(session_token)) => {
            let handle = toasts.add(channel, success_toast(kind));
            tracing::info!(kind = kind.as_str(), toast_id = handle.id(), "callback succeeded");
            CallbackOutcome { redirect: DASHBOARD_PATH, session_token: Some(session_token) }
        }
        Ok(None) => {
            tracing::info!(kind = kind.as_str(), "callback token rejected");
            toasts.add(channel, failure_toast(kind, "The link is invalid or has expired."));
            CallbackOutcome::failed()
        }
        Err(e) => {
            tracing::error!(kind = kind.as_str(), error = %e, "callback exchange failed");
            toasts.add(channel, failure_toast(kind, "Something went wrong. Please try again."));
            CallbackOutcome::failed()
        }
    }
}

#[cfg(test)]
#[path = "callback_test.rs"]
mod tests;
