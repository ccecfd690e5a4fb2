//! Response repository.
//!
//! Uses a dual-document pattern:
//! - Response doc at `responses/{id}`
//! - Claim doc at `response_claims/{rfp_id}_{supplier_id}`
//!
//! Both are written in one commit with "must not exist" preconditions, so a
//! supplier can hold at most one response per RFP even under concurrent
//! submissions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use rfp_models::response::claim_key;
use rfp_models::{ResponseId, ResponseStatus, RfpId, RfpResponse};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::rfp_repo::document_version;
use crate::store::{newest_responses_first, Versioned};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value, Write};

pub const RESPONSES_COLLECTION: &str = "responses";
pub const CLAIMS_COLLECTION: &str = "response_claims";

/// Repository for response documents and their uniqueness claims.
#[derive(Clone)]
pub struct ResponseRepository {
    client: FirestoreClient,
}

impl ResponseRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Insert the response and its claim atomically.
    ///
    /// Returns `AlreadyExists` when the supplier already responded to the RFP.
    pub async fn create(&self, response: &RfpResponse) -> FirestoreResult<()> {
        let key = claim_key(&response.rfp_id, &response.supplier_id);
        let writes = vec![
            Write::create(Document::named(
                self.client.full_document_name(CLAIMS_COLLECTION, &key),
                claim_to_fields(response),
            )),
            Write::create(Document::named(
                self.client
                    .full_document_name(RESPONSES_COLLECTION, response.id.as_str()),
                response_to_fields(response),
            )),
        ];

        match self.client.commit(writes).await {
            Ok(_) => {
                info!(
                    response_id = %response.id,
                    rfp_id = %response.rfp_id,
                    supplier_id = %response.supplier_id,
                    "Created response (atomic with claim)"
                );
                Ok(())
            }
            // A violated exists=false precondition comes back as either.
            Err(FirestoreError::AlreadyExists(_)) | Err(FirestoreError::PreconditionFailed(_)) => {
                warn!(claim = %key, "Response claim already taken");
                Err(FirestoreError::AlreadyExists(format!("{}/{}", CLAIMS_COLLECTION, key)))
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get(&self, id: &ResponseId) -> FirestoreResult<Option<Versioned<RfpResponse>>> {
        match self.client.get_document(RESPONSES_COLLECTION, id.as_str()).await? {
            Some(doc) => {
                let version = document_version(&doc)?;
                Ok(Some(Versioned::new(document_to_response(&doc, id.as_str())?, version)))
            }
            None => Ok(None),
        }
    }

    /// Replace the response if it is unchanged since `expected_version`.
    pub async fn replace(&self, response: &RfpResponse, expected_version: &str) -> FirestoreResult<()> {
        self.client
            .update_document_with_precondition(
                RESPONSES_COLLECTION,
                response.id.as_str(),
                response_to_fields(response),
                Some(expected_version),
            )
            .await?;
        Ok(())
    }

    /// Look up the supplier's response on an RFP through its claim.
    pub async fn find(&self, rfp_id: &RfpId, supplier_id: &str) -> FirestoreResult<Option<RfpResponse>> {
        let key = claim_key(rfp_id, supplier_id);
        let Some(claim) = self.client.get_document(CLAIMS_COLLECTION, &key).await? else {
            return Ok(None);
        };
        let response_id = claim
            .fields
            .as_ref()
            .and_then(|f| f.get("response_id"))
            .and_then(String::from_firestore_value)
            .ok_or_else(|| {
                FirestoreError::invalid_response(format!("{}/{} has no response_id", CLAIMS_COLLECTION, key))
            })?;

        Ok(self
            .get(&ResponseId::from_string(response_id))
            .await?
            .map(|v| v.value))
    }

    pub async fn list_for_buyer(
        &self,
        buyer_id: &str,
        rfp_id: Option<&RfpId>,
    ) -> FirestoreResult<Vec<RfpResponse>> {
        let mut conditions = vec![("buyer_id", buyer_id)];
        if let Some(rfp_id) = rfp_id {
            conditions.push(("rfp_id", rfp_id.as_str()));
        }
        self.query(StructuredQuery::collection(RESPONSES_COLLECTION).where_equal(&conditions))
            .await
    }

    pub async fn list_by_supplier(&self, supplier_id: &str) -> FirestoreResult<Vec<RfpResponse>> {
        self.query(
            StructuredQuery::collection(RESPONSES_COLLECTION).where_equal(&[("supplier_id", supplier_id)]),
        )
        .await
    }

    async fn query(&self, query: StructuredQuery) -> FirestoreResult<Vec<RfpResponse>> {
        let docs = self.client.run_query(None, query).await?;
        let mut responses = docs
            .iter()
            .map(|doc| document_to_response(doc, doc.id().unwrap_or_default()))
            .collect::<FirestoreResult<Vec<_>>>()?;
        newest_responses_first(&mut responses);
        Ok(responses)
    }
}

// ============================================================================
// Field Conversion Helpers
// ============================================================================

fn claim_to_fields(response: &RfpResponse) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("rfp_id".to_string(), response.rfp_id.as_str().to_firestore_value());
    fields.insert("supplier_id".to_string(), response.supplier_id.to_firestore_value());
    fields.insert("response_id".to_string(), response.id.as_str().to_firestore_value());
    fields.insert("created_at".to_string(), response.submitted_at.to_firestore_value());
    fields
}

fn response_to_fields(response: &RfpResponse) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("id".to_string(), response.id.as_str().to_firestore_value());
    fields.insert("rfp_id".to_string(), response.rfp_id.as_str().to_firestore_value());
    fields.insert("supplier_id".to_string(), response.supplier_id.to_firestore_value());
    fields.insert("buyer_id".to_string(), response.buyer_id.to_firestore_value());
    fields.insert("proposal".to_string(), response.proposal.to_firestore_value());
    fields.insert("status".to_string(), response.status.as_str().to_firestore_value());
    fields.insert("submitted_at".to_string(), response.submitted_at.to_firestore_value());

    if let Some(budget) = response.budget {
        fields.insert("budget".to_string(), budget.to_firestore_value());
    }
    if let Some(timeline) = &response.timeline {
        fields.insert("timeline".to_string(), timeline.to_firestore_value());
    }
    if let Some(experience) = &response.experience {
        fields.insert("experience".to_string(), experience.to_firestore_value());
    }
    if let Some(reviewed_at) = response.reviewed_at {
        fields.insert("reviewed_at".to_string(), reviewed_at.to_firestore_value());
    }
    if let Some(reviewed_by) = &response.reviewed_by {
        fields.insert("reviewed_by".to_string(), reviewed_by.to_firestore_value());
    }
    if let Some(reason) = &response.rejection_reason {
        fields.insert("rejection_reason".to_string(), reason.to_firestore_value());
    }

    fields
}

fn document_to_response(doc: &Document, doc_id: &str) -> FirestoreResult<RfpResponse> {
    let fields = doc
        .fields
        .as_ref()
        .ok_or_else(|| FirestoreError::invalid_response("Document has no fields"))?;

    let get_string = |key: &str| -> String {
        fields
            .get(key)
            .and_then(String::from_firestore_value)
            .unwrap_or_default()
    };
    let get_opt_string = |key: &str| -> Option<String> { fields.get(key).and_then(String::from_firestore_value) };
    let get_time = |key: &str| -> Option<DateTime<Utc>> { fields.get(key).and_then(DateTime::from_firestore_value) };

    let status_str = get_string("status");
    let status = ResponseStatus::parse(&status_str).ok_or_else(|| {
        FirestoreError::SerializationError(format!(
            "{}/{}: unknown status '{}'",
            RESPONSES_COLLECTION, doc_id, status_str
        ))
    })?;

    Ok(RfpResponse {
        id: ResponseId::from_string(doc_id),
        rfp_id: RfpId::from_string(get_string("rfp_id")),
        supplier_id: get_string("supplier_id"),
        buyer_id: get_string("buyer_id"),
        proposal: get_string("proposal"),
        budget: fields.get("budget").and_then(f64::from_firestore_value),
        timeline: get_opt_string("timeline"),
        experience: get_opt_string("experience"),
        status,
        submitted_at: get_time("submitted_at").unwrap_or_else(Utc::now),
        reviewed_at: get_time("reviewed_at"),
        reviewed_by: get_opt_string("reviewed_by"),
        rejection_reason: get_opt_string("rejection_reason"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rfp_models::{CreateRfpRequest, Rfp, SubmitResponseRequest};

    fn sample() -> RfpResponse {
        let now = Utc::now();
        let rfp = Rfp::draft(
            "buyer-1",
            CreateRfpRequest {
                title: "Translation".to_string(),
                description: "Docs to French".to_string(),
                company: "Acme".to_string(),
                budget_min: 1.0,
                budget_max: 2.0,
                currency: None,
                deadline: now + Duration::days(1),
                category: "language".to_string(),
                requirements: None,
                priority: None,
                tags: vec![],
                attachments: vec![],
            },
            now,
        );
        RfpResponse::submitted(
            &rfp,
            "supplier-1",
            SubmitResponseRequest {
                proposal: "Native speakers".to_string(),
                budget: Some(1.5),
                timeline: Some("2 weeks".to_string()),
                experience: None,
            },
            now,
        )
    }

    #[test]
    fn test_fields_survive_document_conversion() {
        let mut response = sample();
        response.reject("buyer-1", "Too slow".to_string(), Utc::now());
        let doc = Document::new(response_to_fields(&response));
        let back = document_to_response(&doc, response.id.as_str()).unwrap();

        assert_eq!(back.status, ResponseStatus::Rejected);
        assert_eq!(back.rejection_reason.as_deref(), Some("Too slow"));
        assert_eq!(back.reviewed_by.as_deref(), Some("buyer-1"));
        assert_eq!(back.buyer_id, "buyer-1");
        assert_eq!(back.budget, Some(1.5));
        assert_eq!(back.experience, None);
    }

    #[test]
    fn test_claim_fields_point_at_response() {
        let response = sample();
        let fields = claim_to_fields(&response);
        assert_eq!(
            fields.get("response_id").and_then(String::from_firestore_value),
            Some(response.id.to_string())
        );
    }
}
