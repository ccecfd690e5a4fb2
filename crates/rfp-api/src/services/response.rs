//! Response service: supplier submissions and the buyer review workflow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use validator::Validate;

use rfp_firestore::{FirestoreError, Store, Versioned};
use rfp_models::guard::response::Decision;
use rfp_models::guard::{self, GuardError, GuardResult};
use rfp_models::{Actor, ResponseId, Rfp, RfpId, RfpResponse, Role, SubmitResponseRequest};

use super::MAX_WRITE_ATTEMPTS;
use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_submission;

#[derive(Clone)]
pub struct ResponseService {
    store: Arc<dyn Store>,
}

impl ResponseService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Submit the supplier's single response to a published RFP.
    pub async fn submit(
        &self,
        actor: &Actor,
        rfp_id: &RfpId,
        mut request: SubmitResponseRequest,
    ) -> ApiResult<RfpResponse> {
        guard::require_role(actor, Role::Supplier)?;
        let rfp = self.load_rfp(rfp_id).await?;
        let existing = self.store.find_response(rfp_id, &actor.user_id).await?;

        let now = Utc::now();
        guard::response::check_submit(Some(actor), &rfp, existing.as_ref(), now)?;
        sanitize_submission(&mut request);
        request.validate()?;

        let response = RfpResponse::submitted(&rfp, actor.user_id.clone(), request, now);
        match self.store.insert_response(&response).await {
            Ok(()) => {}
            Err(FirestoreError::AlreadyExists(_)) => {
                debug!(rfp_id = %rfp_id, supplier = %actor.user_id, "Duplicate submission rejected by store");
                return Err(GuardError::AlreadySubmitted.into());
            }
            Err(e) => return Err(e.into()),
        }

        metrics::record_response_submitted();
        info!(
            rfp_id = %rfp_id,
            response_id = %response.id,
            actor = %actor.user_id,
            "Submitted response"
        );
        Ok(response)
    }

    /// submitted -> under_review.
    pub async fn start_review(&self, actor: &Actor, id: &ResponseId) -> ApiResult<RfpResponse> {
        let response = self
            .transition(id, |rfp, response, _| {
                guard::response::check_start_review(Some(actor), rfp, response)?;
                response.start_review();
                Ok(())
            })
            .await?;

        metrics::record_response_reviewed(response.status.as_str());
        info!(response_id = %id, actor = %actor.user_id, "Response under review");
        Ok(response)
    }

    pub async fn approve(&self, actor: &Actor, id: &ResponseId) -> ApiResult<RfpResponse> {
        self.decide(actor, id, Decision::Approve, None).await
    }

    /// Reject with a mandatory reason, stored trimmed.
    pub async fn reject(&self, actor: &Actor, id: &ResponseId, reason: Option<&str>) -> ApiResult<RfpResponse> {
        self.decide(actor, id, Decision::Reject, reason).await
    }

    async fn decide(
        &self,
        actor: &Actor,
        id: &ResponseId,
        decision: Decision,
        reason: Option<&str>,
    ) -> ApiResult<RfpResponse> {
        let response = self
            .transition(id, |rfp, response, now| {
                guard::response::check_review(Some(actor), rfp, response, decision)?;
                match decision {
                    Decision::Approve => response.approve(actor.user_id.clone(), now),
                    Decision::Reject => {
                        let reason = guard::response::validate_rejection_reason(reason)?;
                        response.reject(actor.user_id.clone(), reason, now);
                    }
                }
                Ok(())
            })
            .await?;

        metrics::record_response_reviewed(response.status.as_str());
        info!(
            rfp_id = %response.rfp_id,
            response_id = %id,
            actor = %actor.user_id,
            decision = decision.as_str(),
            "Reviewed response"
        );
        Ok(response)
    }

    /// Detail view for the buyer owning the parent RFP.
    pub async fn get_detail(&self, actor: &Actor, id: &ResponseId) -> ApiResult<RfpResponse> {
        let response = self.load_response(id).await?.value;
        let rfp = self.load_rfp(&response.rfp_id).await?;
        guard::response::check_view_detail(Some(actor), &rfp, &response)?;
        Ok(response)
    }

    /// Responses on the buyer's RFPs, optionally narrowed to one RFP.
    pub async fn list_for_buyer(&self, actor: &Actor, rfp_id: Option<&RfpId>) -> ApiResult<Vec<RfpResponse>> {
        guard::response::check_list_for_buyer(Some(actor), None)?;
        if let Some(id) = rfp_id {
            let rfp = self.load_rfp(id).await?;
            guard::response::check_list_for_buyer(Some(actor), Some(&rfp))?;
        }
        Ok(self
            .store
            .list_responses_for_buyer(&actor.user_id, rfp_id)
            .await?)
    }

    pub async fn list_own(&self, actor: &Actor) -> ApiResult<Vec<RfpResponse>> {
        guard::response::check_list_own(Some(actor))?;
        Ok(self.store.list_responses_by_supplier(&actor.user_id).await?)
    }

    async fn load_rfp(&self, id: &RfpId) -> ApiResult<Rfp> {
        self.store
            .get_rfp(id)
            .await?
            .map(|v| v.value)
            .ok_or_else(|| ApiError::not_found("RFP not found"))
    }

    async fn load_response(&self, id: &ResponseId) -> ApiResult<Versioned<RfpResponse>> {
        self.store
            .get_response(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Response not found"))
    }

    /// Guarded read-modify-write of a response. Ownership is always judged
    /// against the freshly loaded parent RFP.
    async fn transition<F>(&self, id: &ResponseId, mut step: F) -> ApiResult<RfpResponse>
    where
        F: FnMut(&Rfp, &mut RfpResponse, DateTime<Utc>) -> GuardResult<()> + Send,
    {
        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let Versioned { value: mut response, version } = self.load_response(id).await?;
            let rfp = self.load_rfp(&response.rfp_id).await?;
            step(&rfp, &mut response, Utc::now())?;

            match self.store.replace_response(&response, &version).await {
                Ok(()) => return Ok(response),
                Err(e) if e.is_precondition_failed() => {
                    debug!(response_id = %id, attempt, "Response changed since read, reloading");
                }
                Err(e) => return Err(e.into()),
            }
        }

        warn!(response_id = %id, "Response write kept losing to concurrent writers");
        Err(ApiError::InvalidState(
            "response was modified concurrently, please retry".to_string(),
        ))
    }
}
