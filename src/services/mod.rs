//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and talk to the store through
//! `&dyn AuthStore`, so route handlers stay focused on cookies, status
//! codes, and redirects.

pub mod availability;
pub mod callback;
pub mod credentials;
pub mod guard;
pub mod profile;
pub mod role;
pub mod session;
pub mod shell;
pub mod toast;
