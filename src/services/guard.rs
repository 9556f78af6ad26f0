//! Route guard decisions.
//!
//! The guard is a pure function over the outcome of session resolution so
//! the HTTP middleware stays a thin adapter. Resolution errors fail closed.

use url::form_urlencoded;

use super::role::RoleSet;
use super::session::Session;
use crate::store::StoreError;

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the protected view for this session.
    Allow(Session),
    /// Redirect to the given login URL (carries the return target).
    RedirectLogin(String),
    RedirectUnauthorized,
}

/// `/login?redirect=<original>`, with the original path percent-encoded.
#[must_use]
pub fn login_redirect(original: &str) -> String {
    let target: String = form_urlencoded::byte_serialize(original.as_bytes()).collect();
    format!("{LOGIN_PATH}?redirect={target}")
}

/// Decide what a protected route should do with a resolved session.
///
/// An empty `required` set admits any authenticated session.
#[must_use]
pub fn decide(required: &RoleSet, resolved: Result<Option<Session>, StoreError>, original: &str) -> GuardDecision {
    let session = match resolved {
        Ok(Some(session)) => session,
        Ok(None) => return GuardDecision::RedirectLogin(login_redirect(original)),
        Err(e) => {
            tracing::error!(error = %e, path = original, "session resolution failed; treating as signed out");
            return GuardDecision::RedirectLogin(login_redirect(original));
        }
    };

    if !required.is_empty() && !session.roles().intersects(required) {
        tracing::debug!(user_id = %session.user_id, path = original, "role check failed");
        return GuardDecision::RedirectUnauthorized;
    }

    GuardDecision::Allow(session)
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
