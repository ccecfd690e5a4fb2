//! RFP models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::requests::{CreateRfpRequest, UpdateRfpRequest};

/// Default currency for budget ranges.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Unique identifier for an RFP.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct RfpId(pub String);

impl RfpId {
    /// Generate a new random RFP ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RfpId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RfpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RfpId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RfpId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// RFP lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RfpStatus {
    /// Being authored, visible to the owner only
    #[default]
    Draft,
    /// Open for supplier responses
    Published,
    /// No longer accepting responses
    Closed,
    /// A supplier has been selected
    Awarded,
}

impl RfpStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RfpStatus::Draft => "draft",
            RfpStatus::Published => "published",
            RfpStatus::Closed => "closed",
            RfpStatus::Awarded => "awarded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(RfpStatus::Draft),
            "published" => Some(RfpStatus::Published),
            "closed" => Some(RfpStatus::Closed),
            "awarded" => Some(RfpStatus::Awarded),
            _ => None,
        }
    }

    /// Forward-only transition table.
    pub fn can_transition_to(&self, next: RfpStatus) -> bool {
        matches!(
            (self, next),
            (RfpStatus::Draft, RfpStatus::Published)
                | (RfpStatus::Published, RfpStatus::Closed)
                | (RfpStatus::Published, RfpStatus::Awarded)
                | (RfpStatus::Closed, RfpStatus::Awarded)
        )
    }

    /// Content fields are only editable while drafting.
    pub fn is_editable(&self) -> bool {
        matches!(self, RfpStatus::Draft)
    }
}

impl fmt::Display for RfpStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// RFP priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    /// Parse from string, falling back to the default for unknown values.
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "low" => Priority::Low,
            "high" => Priority::High,
            "urgent" => Priority::Urgent,
            _ => Priority::Medium,
        }
    }
}

/// Budget range offered by the buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BudgetRange {
    pub min: f64,
    pub max: f64,
    pub currency: String,
}

impl BudgetRange {
    pub fn new(min: f64, max: f64, currency: impl Into<String>) -> Self {
        Self {
            min,
            max,
            currency: currency.into(),
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.min >= 0.0 && self.min <= self.max
    }
}

/// A file reference attached to an RFP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Attachment {
    pub name: String,
    pub url: String,
}

/// Free-form RFP metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RfpMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A Request for Proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Rfp {
    pub id: RfpId,

    pub title: String,

    pub description: String,

    /// Company issuing the RFP
    pub company: String,

    /// Owning buyer (user ID)
    pub buyer_id: String,

    #[serde(default)]
    pub status: RfpStatus,

    /// Responses are accepted up to and including this instant
    pub deadline: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,

    pub budget: BudgetRange,

    pub category: String,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub metadata: RfpMetadata,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
}

impl Rfp {
    /// Build a new draft RFP owned by `buyer_id` from a validated request.
    pub fn draft(buyer_id: impl Into<String>, request: CreateRfpRequest, now: DateTime<Utc>) -> Self {
        let currency = request
            .currency
            .map(|c| c.trim().to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        Self {
            id: RfpId::new(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            company: request.company.trim().to_string(),
            buyer_id: buyer_id.into(),
            status: RfpStatus::Draft,
            deadline: request.deadline,
            requirements: non_blank(request.requirements),
            budget: BudgetRange::new(request.budget_min, request.budget_max, currency),
            category: request.category.trim().to_string(),
            priority: request.priority.unwrap_or_default(),
            metadata: RfpMetadata {
                tags: normalize_tags(request.tags),
                attachments: request.attachments.into_iter().map(Into::into).collect(),
            },
            created_at: now,
            updated_at: now,
            published_at: None,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.buyer_id == user_id
    }

    /// Deadline has not passed at `now` (inclusive).
    pub fn accepts_responses_at(&self, now: DateTime<Utc>) -> bool {
        self.status == RfpStatus::Published && now <= self.deadline
    }

    /// Merge a partial update into this RFP.
    pub fn apply_update(&mut self, update: UpdateRfpRequest, now: DateTime<Utc>) {
        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description.trim().to_string();
        }
        if let Some(company) = update.company {
            self.company = company.trim().to_string();
        }
        if let Some(deadline) = update.deadline {
            self.deadline = deadline;
        }
        if update.requirements.is_some() {
            self.requirements = non_blank(update.requirements);
        }
        if let Some(min) = update.budget_min {
            self.budget.min = min;
        }
        if let Some(max) = update.budget_max {
            self.budget.max = max;
        }
        if let Some(currency) = update.currency {
            self.budget.currency = currency.trim().to_ascii_uppercase();
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if let Some(priority) = update.priority {
            self.priority = priority;
        }
        if let Some(tags) = update.tags {
            self.metadata.tags = normalize_tags(tags);
        }
        if let Some(attachments) = update.attachments {
            self.metadata.attachments = attachments.into_iter().map(Into::into).collect();
        }
        self.updated_at = now;
    }

    /// Move to `published`. Callers check the guard first.
    pub fn publish(&mut self, now: DateTime<Utc>) {
        self.status = RfpStatus::Published;
        self.published_at = Some(now);
        self.updated_at = now;
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
