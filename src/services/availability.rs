//! Read-only existence checks for tenant subdomains and phone numbers.

use super::credentials::normalize_phone;
use crate::store::{AuthStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("subdomain is required")]
    MissingSubdomain,
    #[error("phone number is required")]
    MissingPhone,
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn required(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|v| !v.is_empty())
}

/// `true` when no tenant has claimed `subdomain` yet.
pub async fn subdomain_available(store: &dyn AuthStore, raw: Option<&str>) -> Result<bool, CheckError> {
    let subdomain = required(raw)
        .ok_or(CheckError::MissingSubdomain)?
        .to_ascii_lowercase();
    let taken = store.subdomain_exists(&subdomain).await?;
    Ok(!taken)
}

/// `true` when an account is registered with `phone`.
///
/// Values that cannot be a phone number simply do not exist.
pub async fn phone_exists(store: &dyn AuthStore, raw: Option<&str>) -> Result<bool, CheckError> {
    let raw = required(raw).ok_or(CheckError::MissingPhone)?;
    let Some(phone) = normalize_phone(raw) else {
        return Ok(false);
    };
    Ok(store.find_user_by_phone(&phone).await?.is_some())
}

#[cfg(test)]
#[path = "availability_test.rs"]
mod tests;
