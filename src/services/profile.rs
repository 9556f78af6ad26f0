//! Profile upsert.
//!
//! Profiles are created on first successful login and refreshed on later
//! logins. The write only happens when a field actually changed, so running
//! the upsert again with the same input leaves the record untouched,
//! `updated_at` included.

use time::OffsetDateTime;
use uuid::Uuid;

use super::role::DEFAULT_ROLE;
use crate::store::{AuthStore, Profile, StoreError, UserRecord};

/// Mutable profile fields supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInput {
    pub user_id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&UserRecord> for ProfileInput {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

fn differs(profile: &Profile, input: &ProfileInput) -> bool {
    profile.email != input.email || profile.first_name != input.first_name || profile.last_name != input.last_name
}

/// Create or update the profile for `input.user_id`, returning the stored state.
pub async fn upsert_profile(store: &dyn AuthStore, input: &ProfileInput) -> Result<Profile, StoreError> {
    match store.get_profile(input.user_id).await? {
        Some(existing) if !differs(&existing, input) => Ok(existing),
        Some(existing) => {
            let updated = Profile {
                email: input.email.clone(),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                updated_at: OffsetDateTime::now_utc(),
                ..existing
            };
            store.update_profile(&updated).await?;
            tracing::debug!(user_id = %input.user_id, "profile updated");
            Ok(updated)
        }
        None => {
            let created = Profile {
                id: input.user_id,
                email: input.email.clone(),
                first_name: input.first_name.clone(),
                last_name: input.last_name.clone(),
                role: DEFAULT_ROLE,
                updated_at: OffsetDateTime::now_utc(),
            };
            store.insert_profile(&created).await?;
            tracing::info!(user_id = %input.user_id, role = %created.role, "profile created");
            Ok(created)
        }
    }
}

/// Refresh the profile from the account's stored metadata after a login.
///
/// A missing account is not an error here; the session was already issued.
pub async fn refresh_after_login(store: &dyn AuthStore, user_id: Uuid) -> Result<Option<Profile>, StoreError> {
    let Some(user) = store.get_user(user_id).await? else {
        return Ok(None);
    };
    upsert_profile(store, &ProfileInput::from(&user))
        .await
        .map(Some)
}

#[cfg(test)]
#[path = "profile_test.rs"]
mod tests;
