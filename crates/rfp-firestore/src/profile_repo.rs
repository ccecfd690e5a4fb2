//! Profile repository: `profiles/{uid}`, holding each user's role.

use std::collections::HashMap;

use chrono::Utc;
use tracing::info;

use rfp_models::{Profile, Role};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

pub const PROFILES_COLLECTION: &str = "profiles";

#[derive(Clone)]
pub struct ProfileRepository {
    client: FirestoreClient,
}

impl ProfileRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, user_id: &str) -> FirestoreResult<Option<Profile>> {
        match self.client.get_document(PROFILES_COLLECTION, user_id).await? {
            Some(doc) => Ok(Some(document_to_profile(&doc, user_id)?)),
            None => Ok(None),
        }
    }

    /// Create the profile; `AlreadyExists` if the user already onboarded.
    pub async fn create(&self, profile: &Profile) -> FirestoreResult<()> {
        self.client
            .create_document(PROFILES_COLLECTION, &profile.user_id, profile_to_fields(profile))
            .await?;
        info!(user_id = %profile.user_id, role = %profile.role, "Created profile");
        Ok(())
    }

    /// Lightweight read used as a connectivity check.
    pub async fn ping(&self) -> FirestoreResult<()> {
        self.client
            .get_document(PROFILES_COLLECTION, "readiness-probe")
            .await
            .map(|_| ())
    }
}

fn profile_to_fields(profile: &Profile) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("user_id".to_string(), profile.user_id.to_firestore_value());
    fields.insert("role".to_string(), profile.role.as_str().to_firestore_value());
    fields.insert("created_at".to_string(), profile.created_at.to_firestore_value());
    if let Some(name) = &profile.display_name {
        fields.insert("display_name".to_string(), name.to_firestore_value());
    }
    if let Some(company) = &profile.company {
        fields.insert("company".to_string(), company.to_firestore_value());
    }
    if let Some(email) = &profile.email {
        fields.insert("email".to_string(), email.to_firestore_value());
    }
    fields
}

fn document_to_profile(doc: &Document, user_id: &str) -> FirestoreResult<Profile> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::invalid_response("Document has no fields"))?;
    let get_opt_string = |key: &str| -> Option<String> { fields.get(key).and_then(String::from_firestore_value) };

    let role_str = get_opt_string("role").unwrap_or_default();
    let role = Role::parse(&role_str).ok_or_else(|| {
        FirestoreError::SerializationError(format!(
            "{}/{}: unknown role '{}'",
            PROFILES_COLLECTION, user_id, role_str
        ))
    })?;

    Ok(Profile {
        user_id: user_id.to_string(),
        role,
        display_name: get_opt_string("display_name"),
        company: get_opt_string("company"),
        email: get_opt_string("email"),
        created_at: fields
            .get("created_at")
            .and_then(chrono::DateTime::from_firestore_value)
            .unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_conversion() {
        let mut profile = Profile::new("u1", Role::Supplier, Utc::now());
        profile.company = Some("Initech".to_string());
        let back = document_to_profile(&Document::new(profile_to_fields(&profile)), "u1").unwrap();
        assert_eq!(back.role, Role::Supplier);
        assert_eq!(back.company.as_deref(), Some("Initech"));
        assert_eq!(back.display_name, None);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let mut fields = HashMap::new();
        fields.insert("role".to_string(), "admin".to_firestore_value());
        assert!(document_to_profile(&Document::new(fields), "u1").is_err());
    }
}
