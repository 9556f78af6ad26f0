//! Existence checks used by sign-up forms.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};

use super::error_json;
use crate::services::availability::{self, CheckError};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SubdomainQuery {
    subdomain: Option<String>,
}

#[derive(Deserialize)]
pub struct PhoneQuery {
    phone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubdomainAvailability {
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PhoneExistence {
    pub exists: bool,
}

pub(crate) fn check_error_to_status(err: &CheckError) -> StatusCode {
    match err {
        CheckError::MissingSubdomain | CheckError::MissingPhone => StatusCode::BAD_REQUEST,
        CheckError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map a check failure to its JSON response. `failure` is the message used
/// for unexpected store errors.
fn check_error_response(err: &CheckError, failure: &str) -> Response {
    let status = check_error_to_status(err);
    let message = match err {
        CheckError::MissingSubdomain => "Subdomain is required",
        CheckError::MissingPhone => "Phone number is required",
        CheckError::Store(e) => {
            tracing::error!(error = %e, "{failure}");
            failure
        }
    };
    error_json(status, message)
}

/// Unparseable query strings get the same JSON error body as other failures.
fn rejection_response(rejection: &QueryRejection) -> Response {
    tracing::debug!(error = %rejection, "query string rejected");
    error_json(rejection.status(), &rejection.body_text())
}

/// `GET /api/check-subdomain?subdomain=`
pub async fn check_subdomain(
    State(state): State<AppState>,
    query: Result<Query<SubdomainQuery>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => return rejection_response(&rejection),
    };
    match availability::subdomain_available(state.store.as_ref(), params.subdomain.as_deref()).await {
        Ok(available) => Json(SubdomainAvailability { available }).into_response(),
        Err(e) => check_error_response(&e, "Failed to check subdomain availability"),
    }
}

/// `GET /api/check-phone?phone=`
pub async fn check_phone(State(state): State<AppState>, query: Result<Query<PhoneQuery>, QueryRejection>) -> Response {
    let params = match query {
        Ok(Query(params)) => params,
        Err(rejection) => return rejection_response(&rejection),
    };
    match availability::phone_exists(state.store.as_ref(), params.phone.as_deref()).await {
        Ok(exists) => Json(PhoneExistence { exists }).into_response(),
        Err(e) => check_error_response(&e, "Failed to check phone number"),
    }
}

#[cfg(test)]
#[path = "checks_test.rs"]
mod tests;
