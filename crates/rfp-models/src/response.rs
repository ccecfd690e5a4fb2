//! Supplier response models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::requests::SubmitResponseRequest;
use crate::rfp::{Rfp, RfpId};

/// Unique identifier for a response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ResponseId(pub String);

impl ResponseId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ResponseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ResponseId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ResponseId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Response review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    #[default]
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ResponseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Submitted => "submitted",
            ResponseStatus::UnderReview => "under_review",
            ResponseStatus::Approved => "approved",
            ResponseStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "submitted" => Some(ResponseStatus::Submitted),
            "under_review" => Some(ResponseStatus::UnderReview),
            "approved" => Some(ResponseStatus::Approved),
            "rejected" => Some(ResponseStatus::Rejected),
            _ => None,
        }
    }

    /// Approved and rejected admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResponseStatus::Approved | ResponseStatus::Rejected)
    }

    /// Whether a review decision (approve/reject) may be taken from this state.
    pub fn is_reviewable(&self) -> bool {
        matches!(self, ResponseStatus::Submitted | ResponseStatus::UnderReview)
    }

    pub fn can_transition_to(&self, next: ResponseStatus) -> bool {
        use ResponseStatus::*;
        matches!(
            (self, next),
            (Submitted, UnderReview)
                | (Submitted, Approved)
                | (Submitted, Rejected)
                | (UnderReview, Approved)
                | (UnderReview, Rejected)
        )
    }
}

impl fmt::Display for ResponseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A supplier's proposal against a specific RFP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RfpResponse {
    pub id: ResponseId,

    pub rfp_id: RfpId,

    /// Submitting supplier (user ID)
    pub supplier_id: String,

    /// Owner of the parent RFP at submission time. Listing index only;
    /// permission checks always go through the parent RFP.
    pub buyer_id: String,

    pub proposal: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,

    #[serde(default)]
    pub status: ResponseStatus,

    pub submitted_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl RfpResponse {
    /// Build a freshly submitted response.
    pub fn submitted(
        rfp: &Rfp,
        supplier_id: impl Into<String>,
        request: SubmitResponseRequest,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            rfp_id: rfp.id.clone(),
            supplier_id: supplier_id.into(),
            buyer_id: rfp.buyer_id.clone(),
            proposal: request.proposal.trim().to_string(),
            budget: request.budget,
            timeline: trimmed(request.timeline),
            experience: trimmed(request.experience),
            status: ResponseStatus::Submitted,
            submitted_at: now,
            reviewed_at: None,
            reviewed_by: None,
            rejection_reason: None,
        }
    }

    pub fn start_review(&mut self) {
        self.status = ResponseStatus::UnderReview;
    }

    pub fn approve(&mut self, reviewer_id: impl Into<String>, now: DateTime<Utc>) {
        self.status = ResponseStatus::Approved;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer_id.into());
        self.rejection_reason = None;
    }

    /// `reason` must already be trimmed and non-empty.
    pub fn reject(&mut self, reviewer_id: impl Into<String>, reason: String, now: DateTime<Utc>) {
        self.status = ResponseStatus::Rejected;
        self.reviewed_at = Some(now);
        self.reviewed_by = Some(reviewer_id.into());
        self.rejection_reason = Some(reason);
    }
}

/// Key of the (RFP, supplier) uniqueness claim.
pub fn claim_key(rfp_id: &RfpId, supplier_id: &str) -> String {
    format!("{}_{}", rfp_id.as_str(), supplier_id)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transitions() {
        use ResponseStatus::*;
        assert!(Submitted.can_transition_to(UnderReview));
        assert!(Submitted.can_transition_to(Approved));
        assert!(UnderReview.can_transition_to(Rejected));
        assert!(!UnderReview.can_transition_to(Submitted));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
        assert!(Approved.is_terminal() && Rejected.is_terminal());
        assert!(Submitted.is_reviewable() && UnderReview.is_reviewable());
    }

    #[test]
    fn test_status_round_trip_strings() {
        for s in [
            ResponseStatus::Submitted,
            ResponseStatus::UnderReview,
            ResponseStatus::Approved,
            ResponseStatus::Rejected,
        ] {
            assert_eq!(ResponseStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(
            serde_json::to_string(&ResponseStatus::UnderReview).unwrap(),
            "\"under_review\""
        );
    }

    #[test]
    fn test_claim_key() {
        assert_eq!(claim_key(&RfpId::from("r1"), "s1"), "r1_s1");
    }
}
