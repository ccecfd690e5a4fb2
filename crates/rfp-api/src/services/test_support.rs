//! Fixtures shared by the service tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use rfp_firestore::{
    FirestoreError, FirestoreResult, MemoryStore, ProfileStore, ResponseStore, RfpStore, Store, Versioned,
};
use rfp_models::{CreateRfpRequest, Profile, ResponseId, Rfp, RfpId, RfpResponse};

pub(crate) fn create_request(title: &str) -> CreateRfpRequest {
    CreateRfpRequest {
        title: title.to_string(),
        description: format!("{} for the head office", title),
        company: "Acme".to_string(),
        budget_min: 1000.0,
        budget_max: 5000.0,
        currency: None,
        deadline: Utc::now() + Duration::days(1),
        category: "facilities".to_string(),
        requirements: None,
        priority: None,
        tags: vec![],
        attachments: vec![],
    }
}

/// `MemoryStore` with switches that simulate a concurrent writer or a
/// stale pre-insert existence check.
#[derive(Default)]
pub(crate) struct HookedStore {
    inner: MemoryStore,
    race_rfp_write: AtomicBool,
    hide_existing_responses: AtomicBool,
    fail_profile_reads: AtomicBool,
}

impl HookedStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// The next `replace_rfp` first lets another writer publish the RFP.
    pub(crate) fn race_next_rfp_write(&self) {
        self.race_rfp_write.store(true, Ordering::SeqCst);
    }

    /// `find_response` reports nothing, as if the check ran before a
    /// concurrent submission landed.
    pub(crate) fn hide_existing_responses(&self) {
        self.hide_existing_responses.store(true, Ordering::SeqCst);
    }

    /// Every `get_profile` fails as if the store were unreachable.
    pub(crate) fn fail_profile_reads(&self) {
        self.fail_profile_reads.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl RfpStore for HookedStore {
    async fn insert_rfp(&self, rfp: &Rfp) -> FirestoreResult<()> {
        self.inner.insert_rfp(rfp).await
    }

    async fn get_rfp(&self, id: &RfpId) -> FirestoreResult<Option<Versioned<Rfp>>> {
        self.inner.get_rfp(id).await
    }

    async fn replace_rfp(&self, rfp: &Rfp, expected_version: &str) -> FirestoreResult<()> {
        if self.race_rfp_write.swap(false, Ordering::SeqCst) {
            if let Some(current) = self.inner.get_rfp(&rfp.id).await? {
                let mut winner = current.value;
                winner.publish(Utc::now());
                self.inner.replace_rfp(&winner, &current.version).await?;
            }
        }
        self.inner.replace_rfp(rfp, expected_version).await
    }

    async fn list_rfps_by_buyer(&self, buyer_id: &str) -> FirestoreResult<Vec<Rfp>> {
        self.inner.list_rfps_by_buyer(buyer_id).await
    }

    async fn list_published(&self, category: Option<&str>, limit: u32) -> FirestoreResult<Vec<Rfp>> {
        self.inner.list_published(category, limit).await
    }
}

#[async_trait]
impl ResponseStore for HookedStore {
    async fn insert_response(&self, response: &RfpResponse) -> FirestoreResult<()> {
        self.inner.insert_response(response).await
    }

    async fn get_response(&self, id: &ResponseId) -> FirestoreResult<Option<Versioned<RfpResponse>>> {
        self.inner.get_response(id).await
    }

    async fn replace_response(&self, response: &RfpResponse, expected_version: &str) -> FirestoreResult<()> {
        self.inner.replace_response(response, expected_version).await
    }

    async fn find_response(&self, rfp_id: &RfpId, supplier_id: &str) -> FirestoreResult<Option<RfpResponse>> {
        if self.hide_existing_responses.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_response(rfp_id, supplier_id).await
    }

    async fn list_responses_for_buyer(
        &self,
        buyer_id: &str,
        rfp_id: Option<&RfpId>,
    ) -> FirestoreResult<Vec<RfpResponse>> {
        self.inner.list_responses_for_buyer(buyer_id, rfp_id).await
    }

    async fn list_responses_by_supplier(&self, supplier_id: &str) -> FirestoreResult<Vec<RfpResponse>> {
        self.inner.list_responses_by_supplier(supplier_id).await
    }
}

#[async_trait]
impl ProfileStore for HookedStore {
    async fn get_profile(&self, user_id: &str) -> FirestoreResult<Option<Profile>> {
        if self.fail_profile_reads.load(Ordering::SeqCst) {
            return Err(FirestoreError::request_failed("profiles unavailable"));
        }
        self.inner.get_profile(user_id).await
    }

    async fn create_profile(&self, profile: &Profile) -> FirestoreResult<()> {
        self.inner.create_profile(profile).await
    }
}

#[async_trait]
impl Store for HookedStore {
    async fn ping(&self) -> FirestoreResult<()> {
        self.inner.ping().await
    }
}
