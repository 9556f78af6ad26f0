//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the store behind a trait object, the toast store, and the parsed
//! configuration. Clone is required by Axum, so every field is cheap to clone.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::toast::ToastStore;
use crate::store::AuthStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AuthStore>,
    pub toasts: ToastStore,
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn AuthStore>, config: AppConfig) -> Self {
        Self { store, toasts: ToastStore::new(config.toast), config: Arc::new(config) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
