use super::*;
use crate::services::credentials::issue_token;
use crate::services::toast::{ToastConfig, ToastVariant};
use crate::store::{MemoryStore, NewUser};

const TTL: Duration = Duration::from_secs(60);

fn toasts() -> ToastStore {
    ToastStore::new(ToastConfig { limit: 5, duration: Duration::from_secs(5) })
}

async fn seeded_user(store: &MemoryStore) -> uuid::Uuid {
    store
        .create_user(NewUser {
            email: "crew@wash.io",
            password: "longenough",
            phone: Some("+15550100"),
            first_name: "Cris",
            last_name: "Crew",
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn missing_token_fails_to_login() {
    let store = MemoryStore::new();
    let toasts = toasts();

    let outcome = exchange(&store, &toasts, "c1", TokenKind::PhoneLogin, None, TTL).await;
    assert_eq!(outcome, CallbackOutcome { redirect: "/login", session_token: None });

    let snap = toasts.snapshot("c1");
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].variant, ToastVariant::Destructive);
}

#[tokio::test]
async fn blank_token_counts_as_missing() {
    let store = MemoryStore::new();
    let outcome = exchange(&store, &toasts(), "c1", TokenKind::PhoneLogin, Some("  "), TTL).await;
    assert_eq!(outcome.redirect, LOGIN_PATH);
}

#[tokio::test]
async fn rejected_token_gives_failure_toast_and_login_never_dashboard() {
    let store = MemoryStore::new();
    let toasts = toasts();

    let outcome = exchange(&store, &toasts, "c1", TokenKind::PhoneLogin, Some("abc"), TTL).await;
    assert_eq!(outcome.redirect, "/login");
    assert!(outcome.session_token.is_none());

    let snap = toasts.snapshot("c1");
    assert_eq!(snap.len(), 1, "pending toast must be replaced by the failure");
    assert_eq!(snap[0].variant, ToastVariant::Destructive);
    assert_eq!(snap[0].title, "Phone login failed");
}

#[tokio::test]
async fn valid_token_creates_session_and_redirects_to_dashboard() {
    let store = MemoryStore::new();
    let toasts = toasts();
    let user_id = seeded_user(&store).await;
    let token = issue_token(&store, user_id, TokenKind::PhoneLogin, TTL).await.unwrap();

    let outcome = exchange(&store, &toasts, "c1", TokenKind::PhoneLogin, Some(&token), TTL).await;
    assert_eq!(outcome.redirect, "/dashboard");

    let session_token = outcome.session_token.unwrap();
    assert_ne!(session_token, token, "one-time token must not double as the session token");
    let session = session::current_user(&store, &session_token).await.unwrap().unwrap();
    assert_eq!(session.user_id, user_id);

    let snap = toasts.snapshot("c1");
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].variant, ToastVariant::Success);
    assert!(store.get_profile(user_id).await.unwrap().is_some(), "first login creates the profile");
}

#[tokio::test]
async fn token_cannot_be_redeemed_twice() {
    let store = MemoryStore::new();
    let user_id = seeded_user(&store).await;
    let token = issue_token(&store, user_id, TokenKind::PasswordReset, TTL).await.unwrap();
    let toasts = toasts();

    let first = exchange(&store, &toasts, "c1", TokenKind::PasswordReset, Some(&token), TTL).await;
    let second = exchange(&store, &toasts, "c1", TokenKind::PasswordReset, Some(&token), TTL).await;
    assert_eq!(first.redirect, DASHBOARD_PATH);
    assert_eq!(second.redirect, LOGIN_PATH);
    assert!(second.session_token.is_none());
}

#[tokio::test]
async fn token_of_other_kind_is_rejected() {
    let store = MemoryStore::new();
    let user_id = seeded_user(&store).await;
    let token = issue_token(&store, user_id, TokenKind::PasswordReset, TTL).await.unwrap();

    let outcome = exchange(&store, &toasts(), "c1", TokenKind::PhoneLogin, Some(&token), TTL).await;
    assert_eq!(outcome.redirect, LOGIN_PATH);
}

#[tokio::test]
async fn store_failure_fails_to_login_with_toast() {
    let store = MemoryStore::new();
    store.set_failing(true);
    let toasts = toasts();

    let outcome = exchange(&store, &toasts, "c1", TokenKind::PasswordReset, Some("abc"), TTL).await;
    assert_eq!(outcome.redirect, LOGIN_PATH);
    let snap = toasts.snapshot("c1");
    assert_eq!(snap.len(), 1);
    assert_eq!(snap[0].title, "Password reset failed");
}
