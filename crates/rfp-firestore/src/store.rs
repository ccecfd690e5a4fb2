//! Persistence seam used by the API services.
//!
//! `FirestoreStore` backs these traits in production and `MemoryStore` in
//! tests and local runs. Both give the same guarantees:
//! - `replace_*` only succeeds if the stored version still equals
//!   `expected_version`, otherwise `PreconditionFailed`
//! - `insert_response` claims the (RFP, supplier) pair atomically with the
//!   response insert, otherwise `AlreadyExists`
//! - `create_profile` fails with `AlreadyExists` if a profile exists

use async_trait::async_trait;

use rfp_models::{Profile, ResponseId, Rfp, RfpId, RfpResponse};

use crate::error::FirestoreResult;

/// Upper bound on published RFPs scanned for one browse request.
pub const BROWSE_SCAN_LIMIT: u32 = 1000;

/// A value together with the store version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    /// Opaque version token; Firestore `updateTime` or a memory counter.
    pub version: String,
}

impl<T> Versioned<T> {
    pub fn new(value: T, version: impl Into<String>) -> Self {
        Self {
            value,
            version: version.into(),
        }
    }
}

#[async_trait]
pub trait RfpStore: Send + Sync {
    async fn insert_rfp(&self, rfp: &Rfp) -> FirestoreResult<()>;

    async fn get_rfp(&self, id: &RfpId) -> FirestoreResult<Option<Versioned<Rfp>>>;

    /// Conditional full replace.
    async fn replace_rfp(&self, rfp: &Rfp, expected_version: &str) -> FirestoreResult<()>;

    /// All RFPs owned by `buyer_id`, newest first.
    async fn list_rfps_by_buyer(&self, buyer_id: &str) -> FirestoreResult<Vec<Rfp>>;

    /// Published RFPs, optionally of one category, at most `limit`.
    async fn list_published(&self, category: Option<&str>, limit: u32) -> FirestoreResult<Vec<Rfp>>;
}

#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Insert a response and claim its (RFP, supplier) pair in one atomic step.
    async fn insert_response(&self, response: &RfpResponse) -> FirestoreResult<()>;

    async fn get_response(&self, id: &ResponseId) -> FirestoreResult<Option<Versioned<RfpResponse>>>;

    /// Conditional full replace.
    async fn replace_response(&self, response: &RfpResponse, expected_version: &str) -> FirestoreResult<()>;

    /// The supplier's response on an RFP, if any.
    async fn find_response(&self, rfp_id: &RfpId, supplier_id: &str) -> FirestoreResult<Option<RfpResponse>>;

    /// Responses on the buyer's RFPs, newest first.
    async fn list_responses_for_buyer(
        &self,
        buyer_id: &str,
        rfp_id: Option<&RfpId>,
    ) -> FirestoreResult<Vec<RfpResponse>>;

    /// Responses submitted by the supplier, newest first.
    async fn list_responses_by_supplier(&self, supplier_id: &str) -> FirestoreResult<Vec<RfpResponse>>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, user_id: &str) -> FirestoreResult<Option<Profile>>;

    async fn create_profile(&self, profile: &Profile) -> FirestoreResult<()>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: RfpStore + ResponseStore + ProfileStore {
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> FirestoreResult<()>;
}

pub(crate) fn newest_rfps_first(rfps: &mut [Rfp]) {
    rfps.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

pub(crate) fn newest_responses_first(responses: &mut [RfpResponse]) {
    responses.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
}
