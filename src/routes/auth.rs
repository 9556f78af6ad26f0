//! Auth routes: sign-up/in/out, one-time link requests and callbacks.

use std::time::Duration as StdDuration;

use axum::extract::{FromRef, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;
use uuid::Uuid;

use super::error_json;
use super::toasts::flash_channel;
use crate::services::callback;
use crate::services::credentials::{self, AuthError, SignUp};
use crate::services::session::{self, Session};
use crate::services::toast::NewToast;
use crate::state::AppState;
use crate::store::TokenKind;

pub(crate) const COOKIE_NAME: &str = "session_token";

fn cookie_max_age(ttl: StdDuration) -> Duration {
    Duration::seconds(i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX))
}

pub(crate) fn session_cookie(token: String, secure: bool, ttl: StdDuration) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(cookie_max_age(ttl))
        .build()
}

fn cleared_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

pub(crate) fn auth_error_to_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidEmail | AuthError::InvalidPhone | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::AlreadyRegistered(_) => StatusCode::CONFLICT,
        AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_error_message(err: &AuthError) -> String {
    match err {
        AuthError::Store(e) => {
            tracing::error!(error = %e, "auth store failure");
            "Something went wrong. Please try again.".to_owned()
        }
        other => {
            let mut msg = other.to_string();
            if let Some(first) = msg.get_mut(0..1) {
                first.make_ascii_uppercase();
            }
            msg
        }
    }
}

// =============================================================================
// AUTH EXTRACTOR
// =============================================================================

/// Authenticated session extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthSession {
    pub session: Session,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
        if token.is_empty() {
            return Err(StatusCode::UNAUTHORIZED);
        }

        let app_state = AppState::from_ref(state);
        let session = session::current_user(app_state.store.as_ref(), token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "session lookup failed");
                StatusCode::INTERNAL_SERVER_ERROR
            })?
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(Self { session, token: token.to_owned() })
    }
}

// =============================================================================
// SIGN UP / SIGN IN
// =============================================================================

/// Mint a session for `user_id`, set the cookie, and respond with the session.
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    channel: &str,
    user_id: Uuid,
    status: StatusCode,
    toast: NewToast,
) -> Response {
    let store = state.store.as_ref();
    let token = match session::create_session(store, user_id, state.config.session_ttl).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(%user_id, error = %e, "session creation failed");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session");
        }
    };
    let session = match session::current_user(store, &token).await {
        Ok(Some(s)) => s,
        Ok(None) => return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session"),
        Err(e) => {
            tracing::error!(%user_id, error = %e, "session lookup after creation failed");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session");
        }
    };

    state.toasts.add(channel, toast);
    let jar = jar.add(session_cookie(token, state.config.cookie_secure, state.config.session_ttl));
    (status, jar, Json(session)).into_response()
}

fn auth_failure(state: &AppState, jar: CookieJar, channel: &str, title: &str, err: &AuthError) -> Response {
    let status = auth_error_to_status(err);
    let message = auth_error_message(err);
    state.toasts.add(channel, NewToast::failure(title, message.clone()));
    (jar, error_json(status, &message)).into_response()
}

/// `POST /api/auth/sign-up`: create account, start session.
pub async fn sign_up(State(state): State<AppState>, jar: CookieJar, Json(body): Json<SignUp>) -> Response {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    match credentials::sign_up(state.store.as_ref(), &body).await {
        Ok(user_id) => {
            let toast = NewToast::success("Account created", "Welcome aboard.");
            start_session(&state, jar, &channel, user_id, StatusCode::CREATED, toast).await
        }
        Err(e) => auth_failure(&state, jar, &channel, "Sign up failed", &e),
    }
}

#[derive(Deserialize)]
pub struct SignInBody {
    email: String,
    password: String,
}

/// `POST /api/auth/sign-in`: verify credentials, start session.
pub async fn sign_in(State(state): State<AppState>, jar: CookieJar, Json(body): Json<SignInBody>) -> Response {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    match credentials::sign_in(state.store.as_ref(), &body.email, &body.password).await {
        Ok(user_id) => {
            let toast = NewToast::success("Welcome back", "");
            start_session(&state, jar, &channel, user_id, StatusCode::OK, toast).await
        }
        Err(e) => auth_failure(&state, jar, &channel, "Sign in failed", &e),
    }
}

/// `GET /api/auth/me`: return current session.
pub async fn me(auth: AuthSession) -> Json<Session> {
    Json(auth.session)
}

/// `POST /api/auth/logout`: delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthSession) -> impl IntoResponse {
    if let Err(e) = session::end_session(state.store.as_ref(), &auth.token).await {
        tracing::warn!(user_id = %auth.session.user_id, error = %e, "session delete failed");
    }

    let jar = CookieJar::new().add(cleared_session_cookie(state.config.cookie_secure));
    (jar, StatusCode::NO_CONTENT)
}

// =============================================================================
// ONE-TIME LINKS
// =============================================================================

#[derive(Deserialize)]
pub struct PhoneLoginBody {
    phone: String,
}

/// `POST /api/auth/phone`: send a phone-login link if the number is registered.
pub async fn request_phone_login(State(state): State<AppState>, Json(body): Json<PhoneLoginBody>) -> Response {
    match credentials::request_phone_login(state.store.as_ref(), &state.config, &body.phone).await {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_json(auth_error_to_status(&e), &auth_error_message(&e)),
    }
}

#[derive(Deserialize)]
pub struct PasswordResetBody {
    email: String,
}

/// `POST /api/auth/password-reset`: send a reset link if the email is registered.
pub async fn request_password_reset(State(state): State<AppState>, Json(body): Json<PasswordResetBody>) -> Response {
    match credentials::request_password_reset(state.store.as_ref(), &state.config, &body.email).await {
        Ok(_) => StatusCode::ACCEPTED.into_response(),
        Err(e) => error_json(auth_error_to_status(&e), &auth_error_message(&e)),
    }
}

#[derive(Deserialize)]
pub struct UpdatePasswordBody {
    password: String,
}

/// `POST /api/auth/password`: set a new password for the signed-in user.
pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    auth: AuthSession,
    Json(body): Json<UpdatePasswordBody>,
) -> Response {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    match credentials::update_password(state.store.as_ref(), auth.session.user_id, &body.password).await {
        Ok(()) => {
            state
                .toasts
                .add(&channel, NewToast::success("Password updated", ""));
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(e) => auth_failure(&state, jar, &channel, "Password update failed", &e),
    }
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    token: Option<String>,
}

async fn run_callback(state: AppState, jar: CookieJar, kind: TokenKind, token: Option<String>) -> Response {
    let (mut jar, channel) = flash_channel(jar, state.config.cookie_secure);
    let outcome = callback::exchange(
        state.store.as_ref(),
        &state.toasts,
        &channel,
        kind,
        token.as_deref(),
        state.config.session_ttl,
    )
    .await;

    if let Some(token) = outcome.session_token {
        jar = jar.add(session_cookie(token, state.config.cookie_secure, state.config.session_ttl));
    }
    (jar, Redirect::temporary(outcome.redirect)).into_response()
}

/// `GET /auth/phone/callback?token=`: redeem a phone-login link.
pub async fn phone_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    run_callback(state, jar, TokenKind::PhoneLogin, params.token).await
}

/// `GET /auth/reset/callback?token=`: redeem a password-reset link.
pub async fn reset_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackQuery>,
) -> Response {
    run_callback(state, jar, TokenKind::PasswordReset, params.token).await
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
