//! Response lifecycle guard: `submitted -> under_review -> {approved, rejected}`.
//!
//! Review permissions are always checked against the parent RFP's owner,
//! never against the denormalized `buyer_id` on the response.

use chrono::{DateTime, Utc};

use super::{require_actor, require_role, GuardError, GuardResult};
use crate::response::{ResponseStatus, RfpResponse};
use crate::rfp::{Rfp, RfpStatus};
use crate::role::{Actor, Role};

/// Review decision taken by the owning buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    pub fn target(&self) -> ResponseStatus {
        match self {
            Decision::Approve => ResponseStatus::Approved,
            Decision::Reject => ResponseStatus::Rejected,
        }
    }
}

/// Supplier submission against `rfp`. `existing` is the supplier's prior
/// response on this RFP, if any.
pub fn check_submit(
    actor: Option<&Actor>,
    rfp: &Rfp,
    existing: Option<&RfpResponse>,
    now: DateTime<Utc>,
) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Supplier)?;

    match rfp.status {
        RfpStatus::Published => {}
        // Drafts are invisible to suppliers.
        RfpStatus::Draft => return Err(GuardError::NotFound("RFP")),
        other => return Err(GuardError::rfp_state("submit", other)),
    }
    if !rfp.accepts_responses_at(now) {
        return Err(GuardError::DeadlinePassed);
    }
    if existing.is_some() {
        return Err(GuardError::AlreadySubmitted);
    }
    Ok(())
}

/// Owning buyer moves a fresh submission into review.
pub fn check_start_review(
    actor: Option<&Actor>,
    rfp: &Rfp,
    response: &RfpResponse,
) -> GuardResult<()> {
    check_parent_owner(actor, rfp, response)?;
    if !response.status.can_transition_to(ResponseStatus::UnderReview) {
        return Err(GuardError::response_state("review", response.status));
    }
    Ok(())
}

/// Owning buyer approves or rejects from `submitted` or `under_review`.
pub fn check_review(
    actor: Option<&Actor>,
    rfp: &Rfp,
    response: &RfpResponse,
    decision: Decision,
) -> GuardResult<()> {
    check_parent_owner(actor, rfp, response)?;
    if !response.status.can_transition_to(decision.target()) {
        return Err(GuardError::response_state(decision.as_str(), response.status));
    }
    Ok(())
}

/// Rejection needs a reason that is non-empty after trimming.
pub fn validate_rejection_reason(reason: Option<&str>) -> GuardResult<String> {
    match reason.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(r.to_string()),
        _ => Err(GuardError::Validation(
            "rejection_reason is required".to_string(),
        )),
    }
}

/// Response detail is visible to the parent RFP's owner only.
pub fn check_view_detail(
    actor: Option<&Actor>,
    rfp: &Rfp,
    response: &RfpResponse,
) -> GuardResult<()> {
    check_parent_owner(actor, rfp, response)
}

/// Buyer listing responses, optionally narrowed to one of their RFPs.
pub fn check_list_for_buyer(actor: Option<&Actor>, rfp: Option<&Rfp>) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Buyer)?;
    if let Some(rfp) = rfp {
        if !rfp.is_owned_by(&actor.user_id) {
            return Err(GuardError::NotOwner);
        }
    }
    Ok(())
}

/// Supplier listing their own responses.
pub fn check_list_own(actor: Option<&Actor>) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Supplier)
}

fn check_parent_owner(
    actor: Option<&Actor>,
    rfp: &Rfp,
    response: &RfpResponse,
) -> GuardResult<()> {
    let actor = require_actor(actor)?;
    require_role(actor, Role::Buyer)?;
    if response.rfp_id != rfp.id {
        return Err(GuardError::NotFound("RFP"));
    }
    if !rfp.is_owned_by(&actor.user_id) {
        return Err(GuardError::NotOwner);
    }
    Ok(())
}
