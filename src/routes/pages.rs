//! Protected dashboard pages.
//!
//! Every entry in [`PAGES`] becomes a route wrapped in [`guard_request`],
//! which runs the guard decision before the page handler sees the request.
//! Handlers only run for allowed sessions and receive the `Session` as a
//! request extension.

use axum::Router;
use axum::extract::{Extension, Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Json, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::auth::COOKIE_NAME;
use crate::services::guard::{self, GuardDecision, UNAUTHORIZED_PATH};
use crate::services::role::RoleSet;
use crate::services::session::{self, Session};
use crate::services::shell::{PAGES, Page, shell_for};
use crate::state::AppState;

/// Middleware state: the app state plus the roles a route requires.
#[derive(Clone)]
pub struct RouteGuard {
    state: AppState,
    required: RoleSet,
}

impl RouteGuard {
    #[must_use]
    pub fn new(state: AppState, required: RoleSet) -> Self {
        Self { state, required }
    }
}

/// Resolve the session cookie and apply the guard decision.
pub async fn guard_request(
    State(guard): State<RouteGuard>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let original = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_owned(), |pq| pq.as_str().to_owned());
    let token = jar.get(COOKIE_NAME).map(Cookie::value).unwrap_or_default();
    let resolved = session::current_user(guard.state.store.as_ref(), token).await;

    match guard::decide(&guard.required, resolved, &original) {
        GuardDecision::Allow(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardDecision::RedirectLogin(target) => Redirect::temporary(&target).into_response(),
        GuardDecision::RedirectUnauthorized => Redirect::temporary(UNAUTHORIZED_PATH).into_response(),
    }
}

fn page_route(state: &AppState, page: &'static Page) -> Router<AppState> {
    let guard = RouteGuard::new(state.clone(), page.required_roles());
    Router::new()
        .route(page.path, get(move |Extension(session): Extension<Session>| async move { Json(shell_for(page, session)) }))
        .route_layer(from_fn_with_state(guard, guard_request))
}

/// One guarded route per dashboard page.
pub fn page_routes(state: &AppState) -> Router<AppState> {
    PAGES
        .iter()
        .fold(Router::new(), |router, page| router.merge(page_route(state, page)))
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
