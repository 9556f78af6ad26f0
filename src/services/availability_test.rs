use super::*;
use crate::store::{MemoryStore, NewUser};

#[tokio::test]
async fn missing_or_blank_subdomain_is_an_error() {
    let store = MemoryStore::new();
    assert!(matches!(subdomain_available(&store, None).await, Err(CheckError::MissingSubdomain)));
    assert!(matches!(subdomain_available(&store, Some("  ")).await, Err(CheckError::MissingSubdomain)));
}

#[tokio::test]
async fn taken_subdomain_is_unavailable_case_insensitively() {
    let store = MemoryStore::new();
    store.seed_tenant("sparkle");
    assert!(!subdomain_available(&store, Some("sparkle")).await.unwrap());
    assert!(!subdomain_available(&store, Some(" Sparkle ")).await.unwrap());
    assert!(subdomain_available(&store, Some("bubbles")).await.unwrap());
}

#[tokio::test]
async fn missing_phone_is_an_error() {
    let store = MemoryStore::new();
    assert!(matches!(phone_exists(&store, None).await, Err(CheckError::MissingPhone)));
    assert!(matches!(phone_exists(&store, Some("")).await, Err(CheckError::MissingPhone)));
}

#[tokio::test]
async fn registered_phone_exists_in_any_format() {
    let store = MemoryStore::new();
    store
        .create_user(NewUser {
            email: "a@wash.io",
            password: "longenough",
            phone: Some("+15550100"),
            first_name: "",
            last_name: "",
        })
        .await
        .unwrap();
    assert!(phone_exists(&store, Some("+15550100")).await.unwrap());
    assert!(phone_exists(&store, Some("+1 555-0100")).await.unwrap());
    assert!(!phone_exists(&store, Some("+15550199")).await.unwrap());
    assert!(!phone_exists(&store, Some("not a phone")).await.unwrap());
}

#[tokio::test]
async fn store_failure_is_propagated() {
    let store = MemoryStore::new();
    store.set_failing(true);
    assert!(matches!(subdomain_available(&store, Some("x")).await, Err(CheckError::Store(_))));
    assert!(matches!(phone_exists(&store, Some("+1555")).await, Err(CheckError::Store(_))));
}
