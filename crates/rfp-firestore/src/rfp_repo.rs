//! RFP repository: `rfps/{id}`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::info;

use rfp_models::{Attachment, BudgetRange, Priority, Rfp, RfpId, RfpMetadata, RfpStatus};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{newest_rfps_first, Versioned};
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

pub const RFPS_COLLECTION: &str = "rfps";

/// Repository for RFP documents.
#[derive(Clone)]
pub struct RfpRepository {
    client: FirestoreClient,
}

impl RfpRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Create a new RFP document.
    pub async fn create(&self, rfp: &Rfp) -> FirestoreResult<()> {
        self.client
            .create_document(RFPS_COLLECTION, rfp.id.as_str(), rfp_to_fields(rfp))
            .await?;
        info!(rfp_id = %rfp.id, buyer_id = %rfp.buyer_id, "Created RFP document");
        Ok(())
    }

    /// Get an RFP with its current `updateTime`.
    pub async fn get(&self, id: &RfpId) -> FirestoreResult<Option<Versioned<Rfp>>> {
        match self.client.get_document(RFPS_COLLECTION, id.as_str()).await? {
            Some(doc) => {
                let version = document_version(&doc)?;
                Ok(Some(Versioned::new(document_to_rfp(&doc, id.as_str())?, version)))
            }
            None => Ok(None),
        }
    }

    /// Replace the RFP if it is unchanged since `expected_version`.
    pub async fn replace(&self, rfp: &Rfp, expected_version: &str) -> FirestoreResult<()> {
        self.client
            .update_document_with_precondition(
                RFPS_COLLECTION,
                rfp.id.as_str(),
                rfp_to_fields(rfp),
                Some(expected_version),
            )
            .await?;
        Ok(())
    }

    pub async fn list_by_buyer(&self, buyer_id: &str) -> FirestoreResult<Vec<Rfp>> {
        let query = StructuredQuery::collection(RFPS_COLLECTION).where_equal(&[("buyer_id", buyer_id)]);
        let mut rfps = self.query(query).await?;
        newest_rfps_first(&mut rfps);
        Ok(rfps)
    }

    /// Published RFPs, newest first, at most `limit`.
    ///
    /// Sorting happens in the query so the limit keeps the newest documents.
    /// Needs composite indexes on `rfps`: (status ASC, created_at DESC) and
    /// (status ASC, category ASC, created_at DESC).
    pub async fn list_published(&self, category: Option<&str>, limit: u32) -> FirestoreResult<Vec<Rfp>> {
        let mut conditions = vec![("status", RfpStatus::Published.as_str())];
        if let Some(category) = category {
            conditions.push(("category", category));
        }
        let query = StructuredQuery::collection(RFPS_COLLECTION)
            .where_equal(&conditions)
            .order_by_desc("created_at")
            .with_limit(limit);
        self.query(query).await
    }

    async fn query(&self, query: StructuredQuery) -> FirestoreResult<Vec<Rfp>> {
        let docs = self.client.run_query(None, query).await?;
        docs.iter()
            .map(|doc| {
                let id = doc.id().unwrap_or_default().to_string();
                document_to_rfp(doc, &id)
            })
            .collect()
    }
}

// ============================================================================
// Field Conversion Helpers
// ============================================================================

pub(crate) fn document_version(doc: &Document) -> FirestoreResult<String> {
    doc.update_time
        .clone()
        .ok_or_else(|| FirestoreError::invalid_response("Document has no updateTime"))
}

fn rfp_to_fields(rfp: &Rfp) -> HashMap<String, Value> {
    let mut budget = HashMap::new();
    budget.insert("min".to_string(), rfp.budget.min.to_firestore_value());
    budget.insert("max".to_string(), rfp.budget.max.to_firestore_value());
    budget.insert("currency".to_string(), rfp.budget.currency.to_firestore_value());

    let attachments: Vec<Value> = rfp
        .metadata
        .attachments
        .iter()
        .map(|a| {
            let mut fields = HashMap::new();
            fields.insert("name".to_string(), a.name.to_firestore_value());
            fields.insert("url".to_string(), a.url.to_firestore_value());
            Value::map(fields)
        })
        .collect();
    let mut metadata = HashMap::new();
    metadata.insert("tags".to_string(), rfp.metadata.tags.to_firestore_value());
    metadata.insert(
        "attachments".to_string(),
        Value::ArrayValue(crate::types::ArrayValue {
            values: Some(attachments),
        }),
    );

    let mut fields = HashMap::new();
    fields.insert("id".to_string(), rfp.id.as_str().to_firestore_value());
    fields.insert("title".to_string(), rfp.title.to_firestore_value());
    fields.insert("description".to_string(), rfp.description.to_firestore_value());
    fields.insert("company".to_string(), rfp.company.to_firestore_value());
    fields.insert("buyer_id".to_string(), rfp.buyer_id.to_firestore_value());
    fields.insert("status".to_string(), rfp.status.as_str().to_firestore_value());
    fields.insert("deadline".to_string(), rfp.deadline.to_firestore_value());
    fields.insert("budget".to_string(), Value::map(budget));
    fields.insert("category".to_string(), rfp.category.to_firestore_value());
    fields.insert("priority".to_string(), rfp.priority.as_str().to_firestore_value());
    fields.insert("metadata".to_string(), Value::map(metadata));
    fields.insert("created_at".to_string(), rfp.created_at.to_firestore_value());
    fields.insert("updated_at".to_string(), rfp.updated_at.to_firestore_value());

    if let Some(requirements) = &rfp.requirements {
        fields.insert("requirements".to_string(), requirements.to_firestore_value());
    }
    if let Some(published_at) = rfp.published_at {
        fields.insert("published_at".to_string(), published_at.to_firestore_value());
    }

    fields
}

fn document_to_rfp(doc: &Document, doc_id: &str) -> FirestoreResult<Rfp> {
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
    let get_time = |key: &str| -> Option<DateTime<Utc>> {
        fields.get(key).and_then(DateTime::from_firestore_value)
    };

    let status_str = get_string("status");
    let status = RfpStatus::parse(&status_str).ok_or_else(|| {
        FirestoreError::SerializationError(format!("rfps/{}: unknown status '{}'", doc_id, status_str))
    })?;
    let deadline = get_time("deadline").ok_or_else(|| {
        FirestoreError::SerializationError(format!("rfps/{}: missing deadline", doc_id))
    })?;

    let budget = fields.get("budget").and_then(Value::as_map);
    let budget_number = |key: &str| -> f64 {
        budget
            .and_then(|b| b.get(key))
            .and_then(f64::from_firestore_value)
            .unwrap_or(0.0)
    };
    let currency = budget
        .and_then(|b| b.get("currency"))
        .and_then(String::from_firestore_value)
        .unwrap_or_else(|| rfp_models::rfp::DEFAULT_CURRENCY.to_string());

    let metadata = fields.get("metadata").and_then(Value::as_map);
    let tags = metadata
        .and_then(|m| m.get("tags"))
        .and_then(Vec::<String>::from_firestore_value)
        .unwrap_or_default();
    let attachments = metadata
        .and_then(|m| m.get("attachments"))
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(value_to_attachment).collect())
        .unwrap_or_default();

    let created_at = get_time("created_at").unwrap_or_else(Utc::now);

    Ok(Rfp {
        id: RfpId::from_string(doc_id),
        title: get_string("title"),
        description: get_string("description"),
        company: get_string("company"),
        buyer_id: get_string("buyer_id"),
        status,
        deadline,
        requirements: fields.get("requirements").and_then(String::from_firestore_value),
        budget: BudgetRange::new(budget_number("min"), budget_number("max"), currency),
        category: get_string("category"),
        priority: Priority::from_str_or_default(&get_string("priority")),
        metadata: RfpMetadata { tags, attachments },
        created_at,
        updated_at: get_time("updated_at").unwrap_or(created_at),
        published_at: get_time("published_at"),
    })
}

fn value_to_attachment(value: &Value) -> Option<Attachment> {
    let fields = value.as_map()?;
    Some(Attachment {
        name: fields.get("name").and_then(String::from_firestore_value)?,
        url: fields.get("url").and_then(String::from_firestore_value)?,
    })
}
