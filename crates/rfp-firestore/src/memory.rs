//! In-process `Store` with the same conflict semantics as Firestore.
//!
//! Every document carries a monotonically increasing version; conditional
//! replaces compare it the way Firestore compares `updateTime`. Response
//! claims are checked and inserted under one write lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use rfp_models::response::claim_key;
use rfp_models::{Profile, ResponseId, Rfp, RfpId, RfpResponse, RfpStatus};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{
    newest_responses_first, newest_rfps_first, ProfileStore, ResponseStore, RfpStore, Store, Versioned,
};

#[derive(Default)]
struct Tables {
    clock: u64,
    rfps: HashMap<String, (Rfp, u64)>,
    responses: HashMap<String, (RfpResponse, u64)>,
    /// claim key -> response id
    claims: HashMap<String, String>,
    profiles: HashMap<String, Profile>,
}

impl Tables {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn precondition_failed(path: String, expected: &str, actual: u64) -> FirestoreError {
    FirestoreError::PreconditionFailed(format!(
        "{}: expected version {}, found {}",
        path, expected, actual
    ))
}

#[async_trait]
impl RfpStore for MemoryStore {
    async fn insert_rfp(&self, rfp: &Rfp) -> FirestoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.rfps.contains_key(rfp.id.as_str()) {
            return Err(FirestoreError::AlreadyExists(format!("rfps/{}", rfp.id)));
        }
        let version = tables.tick();
        tables.rfps.insert(rfp.id.to_string(), (rfp.clone(), version));
        Ok(())
    }

    async fn get_rfp(&self, id: &RfpId) -> FirestoreResult<Option<Versioned<Rfp>>> {
        let tables = self.tables.read().await;
        Ok(tables
            .rfps
            .get(id.as_str())
            .map(|(rfp, version)| Versioned::new(rfp.clone(), version.to_string())))
    }

    async fn replace_rfp(&self, rfp: &Rfp, expected_version: &str) -> FirestoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = match tables.rfps.get(rfp.id.as_str()) {
            Some((_, version)) => *version,
            None => return Err(FirestoreError::not_found(format!("rfps/{}", rfp.id))),
        };
        if current.to_string() != expected_version {
            return Err(precondition_failed(format!("rfps/{}", rfp.id), expected_version, current));
        }
        let version = tables.tick();
        tables.rfps.insert(rfp.id.to_string(), (rfp.clone(), version));
        Ok(())
    }

    async fn list_rfps_by_buyer(&self, buyer_id: &str) -> FirestoreResult<Vec<Rfp>> {
        let tables = self.tables.read().await;
        let mut rfps: Vec<Rfp> = tables
            .rfps
            .values()
            .filter(|(rfp, _)| rfp.buyer_id == buyer_id)
            .map(|(rfp, _)| rfp.clone())
            .collect();
        newest_rfps_first(&mut rfps);
        Ok(rfps)
    }

    async fn list_published(&self, category: Option<&str>, limit: u32) -> FirestoreResult<Vec<Rfp>> {
        let tables = self.tables.read().await;
        let mut rfps: Vec<Rfp> = tables
            .rfps
            .values()
            .map(|(rfp, _)| rfp)
            .filter(|rfp| rfp.status == RfpStatus::Published)
            .filter(|rfp| category.map_or(true, |c| rfp.category == c))
            .cloned()
            .collect();
        newest_rfps_first(&mut rfps);
        rfps.truncate(limit as usize);
        Ok(rfps)
    }
}

#[async_trait]
impl ResponseStore for MemoryStore {
    async fn insert_response(&self, response: &RfpResponse) -> FirestoreResult<()> {
        let key = claim_key(&response.rfp_id, &response.supplier_id);
        let mut tables = self.tables.write().await;
        if tables.claims.contains_key(&key) {
            return Err(FirestoreError::AlreadyExists(format!("response_claims/{}", key)));
        }
        if tables.responses.contains_key(response.id.as_str()) {
            return Err(FirestoreError::AlreadyExists(format!("responses/{}", response.id)));
        }
        let version = tables.tick();
        tables.claims.insert(key, response.id.to_string());
        tables
            .responses
            .insert(response.id.to_string(), (response.clone(), version));
        Ok(())
    }

    async fn get_response(&self, id: &ResponseId) -> FirestoreResult<Option<Versioned<RfpResponse>>> {
        let tables = self.tables.read().await;
        Ok(tables
            .responses
            .get(id.as_str())
            .map(|(response, version)| Versioned::new(response.clone(), version.to_string())))
    }

    async fn replace_response(&self, response: &RfpResponse, expected_version: &str) -> FirestoreResult<()> {
        let mut tables = self.tables.write().await;
        let current = match tables.responses.get(response.id.as_str()) {
            Some((_, version)) => *version,
            None => return Err(FirestoreError::not_found(format!("responses/{}", response.id))),
        };
        if current.to_string() != expected_version {
            return Err(precondition_failed(
                format!("responses/{}", response.id),
                expected_version,
                current,
            ));
        }
        let version = tables.tick();
        tables
            .responses
            .insert(response.id.to_string(), (response.clone(), version));
        Ok(())
    }

    async fn find_response(&self, rfp_id: &RfpId, supplier_id: &str) -> FirestoreResult<Option<RfpResponse>> {
        let tables = self.tables.read().await;
        Ok(tables
            .claims
            .get(&claim_key(rfp_id, supplier_id))
            .and_then(|id| tables.responses.get(id))
            .map(|(response, _)| response.clone()))
    }

    async fn list_responses_for_buyer(
        &self,
        buyer_id: &str,
        rfp_id: Option<&RfpId>,
    ) -> FirestoreResult<Vec<RfpResponse>> {
        let tables = self.tables.read().await;
        let mut responses: Vec<RfpResponse> = tables
            .responses
            .values()
            .map(|(response, _)| response)
            .filter(|r| r.buyer_id == buyer_id)
            .filter(|r| rfp_id.map_or(true, |id| &r.rfp_id == id))
            .cloned()
            .collect();
        newest_responses_first(&mut responses);
        Ok(responses)
    }

    async fn list_responses_by_supplier(&self, supplier_id: &str) -> FirestoreResult<Vec<RfpResponse>> {
        let tables = self.tables.read().await;
        let mut responses: Vec<RfpResponse> = tables
            .responses
            .values()
            .map(|(response, _)| response)
            .filter(|r| r.supplier_id == supplier_id)
            .cloned()
            .collect();
        newest_responses_first(&mut responses);
        Ok(responses)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, user_id: &str) -> FirestoreResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(user_id).cloned())
    }

    async fn create_profile(&self, profile: &Profile) -> FirestoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(FirestoreError::AlreadyExists(format!("profiles/{}", profile.user_id)));
        }
        tables.profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> FirestoreResult<()> {
        Ok(())
    }
}
