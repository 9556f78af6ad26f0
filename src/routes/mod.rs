//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! This module binds the JSON API, the one-time link callbacks, and the
//! guarded dashboard pages under a single Axum router. Anything not matched
//! falls through to the static front-end directory.

pub mod auth;
pub mod checks;
pub mod pages;
pub mod toasts;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::credentials::{PHONE_CALLBACK_PATH, RESET_CALLBACK_PATH};
use crate::state::AppState;

/// Body of every JSON error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub message: String,
}

pub(crate) fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody { message: message.to_owned() })).into_response()
}

fn api_routes() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/check-subdomain", get(checks::check_subdomain))
        .route("/api/check-phone", get(checks::check_phone))
        .route("/api/auth/sign-up", post(auth::sign_up))
        .route("/api/auth/sign-in", post(auth::sign_in))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/phone", post(auth::request_phone_login))
        .route("/api/auth/password-reset", post(auth::request_password_reset))
        .route("/api/auth/password", post(auth::update_password))
        .route("/api/toasts", get(toasts::list))
        .route("/api/toasts/stream", get(toasts::stream))
        .route("/api/toasts/{id}", delete(toasts::dismiss))
        .route("/healthz", get(healthz))
        .layer(cors)
}

/// Full application router.
pub fn app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir).append_index_html_on_directories(true);

    Router::new()
        .merge(api_routes())
        .route(PHONE_CALLBACK_PATH, get(auth::phone_callback))
        .route(RESET_CALLBACK_PATH, get(auth::reset_callback))
        .merge(pages::page_routes(&state))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
