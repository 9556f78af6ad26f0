//! Toast read/dismiss endpoints and the live toast stream.
//!
//! DESIGN
//! ======
//! Each browser gets a `flash_id` cookie on first contact; its value names
//! the toast channel. Handlers that push toasts and handlers that read them
//! resolve the channel the same way through [`flash_channel`].

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use futures::Stream;
use futures::stream;
use uuid::Uuid;

use crate::services::toast::{Toast, ToastId, ToastStore};
use crate::state::AppState;

pub(crate) const FLASH_COOKIE: &str = "flash_id";

/// Resolve the caller's toast channel, issuing a `flash_id` cookie if absent.
pub(crate) fn flash_channel(jar: CookieJar, secure: bool) -> (CookieJar, String) {
    if let Some(existing) = jar.get(FLASH_COOKIE).map(Cookie::value).filter(|v| !v.is_empty()) {
        let channel = existing.to_owned();
        return (jar, channel);
    }

    let channel = Uuid::new_v4().to_string();
    let cookie = Cookie::build((FLASH_COOKIE, channel.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build();
    (jar.add(cookie), channel)
}

/// `GET /api/toasts`: current toasts for this browser, oldest first.
pub async fn list(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    (jar, Json(state.toasts.snapshot(&channel)))
}

/// `DELETE /api/toasts/{id}`: always 204; unknown ids are a no-op.
pub async fn dismiss(State(state): State<AppState>, jar: CookieJar, Path(id): Path<ToastId>) -> impl IntoResponse {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    if !state.toasts.dismiss_in(&channel, id) {
        tracing::debug!(toast_id = id, "dismiss for missing toast");
    }
    (jar, StatusCode::NO_CONTENT)
}

fn snapshot_event(snapshot: &[Toast]) -> Event {
    Event::default()
        .event("toasts")
        .json_data(snapshot)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "toast snapshot serialization failed");
            Event::default().event("toasts").data("[]")
        })
}

/// Emit the channel snapshot now, then again whenever it differs from the
/// last one sent. Changes to other channels wake the loop but emit nothing.
fn snapshot_stream(toasts: ToastStore, channel: String) -> impl Stream<Item = Result<Event, Infallible>> {
    let rx = toasts.subscribe();
    stream::unfold((rx, toasts, channel, None), |(mut rx, toasts, channel, last)| async move {
        let snapshot = loop {
            let current = toasts.snapshot(&channel);
            if last.as_ref() != Some(&current) {
                break current;
            }
            if rx.changed().await.is_err() {
                return None;
            }
        };
        let event = snapshot_event(&snapshot);
        Some((Ok(event), (rx, toasts, channel, Some(snapshot))))
    })
}

/// `GET /api/toasts/stream`: server-sent toast snapshots.
pub async fn stream(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let (jar, channel) = flash_channel(jar, state.config.cookie_secure);
    let events = snapshot_stream(state.toasts.clone(), channel);
    (jar, Sse::new(events).keep_alive(KeepAlive::default()))
}

#[cfg(test)]
#[path = "toasts_test.rs"]
mod tests;
