//! `Store` backed by Firestore repositories.

use async_trait::async_trait;

use rfp_models::{Profile, ResponseId, Rfp, RfpId, RfpResponse};

use crate::client::FirestoreClient;
use crate::error::FirestoreResult;
use crate::profile_repo::ProfileRepository;
use crate::response_repo::ResponseRepository;
use crate::rfp_repo::RfpRepository;
use crate::store::{ProfileStore, ResponseStore, RfpStore, Store, Versioned};

#[derive(Clone)]
pub struct FirestoreStore {
    rfps: RfpRepository,
    responses: ResponseRepository,
    profiles: ProfileRepository,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            rfps: RfpRepository::new(client.clone()),
            responses: ResponseRepository::new(client.clone()),
            profiles: ProfileRepository::new(client),
        }
    }
}

#[async_trait]
impl RfpStore for FirestoreStore {
    async fn insert_rfp(&self, rfp: &Rfp) -> FirestoreResult<()> {
        self.rfps.create(rfp).await
    }

    async fn get_rfp(&self, id: &RfpId) -> FirestoreResult<Option<Versioned<Rfp>>> {
        self.rfps.get(id).await
    }

    async fn replace_rfp(&self, rfp: &Rfp, expected_version: &str) -> FirestoreResult<()> {
        self.rfps.replace(rfp, expected_version).await
    }

    async fn list_rfps_by_buyer(&self, buyer_id: &str) -> FirestoreResult<Vec<Rfp>> {
        self.rfps.list_by_buyer(buyer_id).await
    }

    async fn list_published(&self, category: Option<&str>, limit: u32) -> FirestoreResult<Vec<Rfp>> {
        self.rfps.list_published(category, limit).await
    }
}

#[async_trait]
impl ResponseStore for FirestoreStore {
    async fn insert_response(&self, response: &RfpResponse) -> FirestoreResult<()> {
        self.responses.create(response).await
    }

    async fn get_response(&self, id: &ResponseId) -> FirestoreResult<Option<Versioned<RfpResponse>>> {
        self.responses.get(id).await
    }

    async fn replace_response(&self, response: &RfpResponse, expected_version: &str) -> FirestoreResult<()> {
        self.responses.replace(response, expected_version).await
    }

    async fn find_response(&self, rfp_id: &RfpId, supplier_id: &str) -> FirestoreResult<Option<RfpResponse>> {
        self.responses.find(rfp_id, supplier_id).await
    }

    async fn list_responses_for_buyer(
        &self,
        buyer_id: &str,
        rfp_id: Option<&RfpId>,
    ) -> FirestoreResult<Vec<RfpResponse>> {
        self.responses.list_for_buyer(buyer_id, rfp_id).await
    }

    async fn list_responses_by_supplier(&self, supplier_id: &str) -> FirestoreResult<Vec<RfpResponse>> {
        self.responses.list_by_supplier(supplier_id).await
    }
}

#[async_trait]
impl ProfileStore for FirestoreStore {
    async fn get_profile(&self, user_id: &str) -> FirestoreResult<Option<Profile>> {
        self.profiles.get(user_id).await
    }

    async fn create_profile(&self, profile: &Profile) -> FirestoreResult<()> {
        self.profiles.create(profile).await
    }
}

#[async_trait]
impl Store for FirestoreStore {
    async fn ping(&self) -> FirestoreResult<()> {
        self.profiles.ping().await
    }
}
