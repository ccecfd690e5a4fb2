//! Profile onboarding: each user picks a role exactly once.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use validator::Validate;

use rfp_firestore::{FirestoreError, Store};
use rfp_models::{OnboardProfileRequest, Profile};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::security::sanitize_text;

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self, user: &AuthUser) -> ApiResult<Profile> {
        self.store
            .get_profile(&user.uid)
            .await?
            .ok_or_else(|| ApiError::not_found("Profile not found"))
    }

    /// Create the caller's profile. The role cannot be changed afterwards.
    pub async fn onboard(&self, user: &AuthUser, request: OnboardProfileRequest) -> ApiResult<Profile> {
        request.validate()?;

        let mut profile = Profile::new(user.uid.clone(), request.role, Utc::now());
        profile.display_name = non_empty(request.display_name.as_deref(), 100);
        profile.company = non_empty(request.company.as_deref(), 200);
        profile.email = user.email.clone();

        match self.store.create_profile(&profile).await {
            Ok(()) => {
                info!(user_id = %profile.user_id, role = %profile.role, "Onboarded user");
                Ok(profile)
            }
            Err(FirestoreError::AlreadyExists(_)) => Err(ApiError::ProfileExists(
                "role already set for this account".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

fn non_empty(value: Option<&str>, max_chars: usize) -> Option<String> {
    value
        .map(|v| sanitize_text(v, max_chars).trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfp_firestore::MemoryStore;
    use rfp_models::Role;

    fn user(uid: &str) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: Some(format!("{}@example.com", uid)),
            email_verified: true,
        }
    }

    fn request(role: Role) -> OnboardProfileRequest {
        OnboardProfileRequest {
            role,
            display_name: Some("  Dana ".to_string()),
            company: Some("   ".to_string()),
        }
    }

    #[tokio::test]
    async fn test_onboard_once() {
        let service = ProfileService::new(Arc::new(MemoryStore::new()));
        let alice = user("alice");

        assert!(matches!(service.get(&alice).await, Err(ApiError::NotFound(_))));

        let profile = service.onboard(&alice, request(Role::Buyer)).await.unwrap();
        assert_eq!(profile.role, Role::Buyer);
        assert_eq!(profile.display_name.as_deref(), Some("Dana"));
        assert_eq!(profile.company, None);
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));

        let err = service.onboard(&alice, request(Role::Supplier)).await.unwrap_err();
        assert!(matches!(err, ApiError::ProfileExists(_)));
        assert_eq!(service.get(&alice).await.unwrap().role, Role::Buyer);
    }
}
