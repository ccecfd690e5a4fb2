//! API request schemas.
//!
//! Field rules are declared with `validator` derives; cross-field rules use
//! schema-level validation functions.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::rfp::{Attachment, Priority};
use crate::role::Role;

pub const MAX_TAG_LENGTH: usize = 50;

/// Attachment reference supplied by the buyer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentInput {
    pub name: String,
    pub url: String,
}

impl From<AttachmentInput> for Attachment {
    fn from(input: AttachmentInput) -> Self {
        Attachment {
            name: input.name.trim().to_string(),
            url: input.url.trim().to_string(),
        }
    }
}

/// Create RFP request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_create_budget"))]
pub struct CreateRfpRequest {
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: String,

    #[validate(length(min = 1, max = 20000), custom(function = "not_blank"))]
    pub description: String,

    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub company: String,

    #[validate(range(min = 0.0))]
    pub budget_min: f64,

    #[validate(range(min = 0.0))]
    pub budget_max: f64,

    #[serde(default)]
    #[validate(custom(function = "currency_code"))]
    pub currency: Option<String>,

    #[validate(custom(function = "in_future"))]
    pub deadline: DateTime<Utc>,

    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: String,

    #[serde(default)]
    #[validate(length(max = 20000))]
    pub requirements: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    #[validate(length(max = 20), custom(function = "valid_tags"))]
    pub tags: Vec<String>,

    #[serde(default)]
    #[validate(length(max = 20), custom(function = "valid_attachments"))]
    pub attachments: Vec<AttachmentInput>,
}

/// Partial RFP update. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[validate(schema(function = "validate_update_budget"))]
pub struct UpdateRfpRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub title: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 20000), custom(function = "not_blank"))]
    pub description: Option<String>,

    #[serde(default)]
    #[validate(length(min = 1, max = 200), custom(function = "not_blank"))]
    pub company: Option<String>,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub budget_min: Option<f64>,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub budget_max: Option<f64>,

    #[serde(default)]
    #[validate(custom(function = "currency_code"))]
    pub currency: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "in_future"))]
    pub deadline: Option<DateTime<Utc>>,

    #[serde(default)]
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub category: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20000))]
    pub requirements: Option<String>,

    #[serde(default)]
    pub priority: Option<Priority>,

    #[serde(default)]
    #[validate(length(max = 20), custom(function = "valid_tags"))]
    pub tags: Option<Vec<String>>,

    #[serde(default)]
    #[validate(length(max = 20), custom(function = "valid_attachments"))]
    pub attachments: Option<Vec<AttachmentInput>>,
}

impl UpdateRfpRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.company.is_none()
            && self.budget_min.is_none()
            && self.budget_max.is_none()
            && self.currency.is_none()
            && self.deadline.is_none()
            && self.category.is_none()
            && self.requirements.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
            && self.attachments.is_none()
    }
}

/// Supplier response submission.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct SubmitResponseRequest {
    #[serde(default)]
    #[validate(length(max = 20000), custom(function = "not_blank"))]
    pub proposal: String,

    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub budget: Option<f64>,

    #[serde(default)]
    #[validate(length(max = 500))]
    pub timeline: Option<String>,

    #[serde(default)]
    #[validate(length(max = 20000))]
    pub experience: Option<String>,
}

/// Rejection body. The reason is checked by the response guard so that a
/// missing and a whitespace-only reason fail the same way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RejectResponseRequest {
    #[serde(default, alias = "reason")]
    pub rejection_reason: Option<String>,
}

/// First-login profile setup.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, JsonSchema)]
pub struct OnboardProfileRequest {
    pub role: Role,

    #[serde(default)]
    #[validate(length(max = 100))]
    pub display_name: Option<String>,

    #[serde(default)]
    #[validate(length(max = 200))]
    pub company: Option<String>,
}

/// Flatten validation errors into one caller-facing line.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let text = errors.to_string();
    let parts: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if parts.is_empty() {
        "Invalid request".to_string()
    } else {
        parts.join("; ")
    }
}

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "must not be blank"));
    }
    Ok(())
}

fn in_future(value: &DateTime<Utc>) -> Result<(), ValidationError> {
    if *value <= Utc::now() {
        return Err(error("deadline_past", "deadline must be in the future"));
    }
    Ok(())
}

fn currency_code(value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    if value.len() != 3 || !value.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(error("currency", "currency must be a 3-letter code"));
    }
    Ok(())
}

fn valid_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.chars().count() > MAX_TAG_LENGTH) {
        return Err(error("tag_length", "tags must be at most 50 characters"));
    }
    Ok(())
}

fn valid_attachments(items: &[AttachmentInput]) -> Result<(), ValidationError> {
    for item in items {
        if item.name.trim().is_empty() {
            return Err(error("attachment_name", "attachment name must not be blank"));
        }
        if !is_public_http_url(item.url.trim()) {
            return Err(error("attachment_url", "attachment url must be an http(s) url"));
        }
    }
    Ok(())
}

fn is_public_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

fn validate_create_budget(request: &CreateRfpRequest) -> Result<(), ValidationError> {
    if request.budget_min > request.budget_max {
        return Err(error("budget_range", "budget_min must not exceed budget_max"));
    }
    Ok(())
}

fn validate_update_budget(request: &UpdateRfpRequest) -> Result<(), ValidationError> {
    if let (Some(min), Some(max)) = (request.budget_min, request.budget_max) {
        if min > max {
            return Err(error("budget_range", "budget_min must not exceed budget_max"));
        }
    }
    Ok(())
}
