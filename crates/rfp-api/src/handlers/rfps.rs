//! RFP handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use rfp_models::{
    BrowseQuery, CreateRfpRequest, Page, ResponseStatus, Rfp, RfpId, SubmitResponseRequest,
    UpdateRfpRequest,
};

use crate::auth::AuthActor;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Acknowledgement returned to a supplier after submitting.
#[derive(Serialize)]
pub struct SubmissionReceipt {
    pub id: String,
    pub rfp_id: String,
    pub status: ResponseStatus,
    pub submitted_at: DateTime<Utc>,
}

/// Create a draft RFP.
pub async fn create_rfp(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Json(request): Json<CreateRfpRequest>,
) -> ApiResult<(StatusCode, Json<Rfp>)> {
    let rfp = state.rfps.create(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(rfp)))
}

/// List the caller's own RFPs, newest first.
pub async fn list_own_rfps(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> ApiResult<Json<Vec<Rfp>>> {
    Ok(Json(state.rfps.list_own(&actor).await?))
}

/// Browse published RFPs. No authentication.
pub async fn browse_rfps(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> ApiResult<Json<Page<Rfp>>> {
    Ok(Json(state.rfps.browse(query).await?))
}

/// Owner view of a single RFP.
pub async fn get_rfp(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Json<Rfp>> {
    let id = RfpId::from(id);
    Ok(Json(state.rfps.get_owned(&actor, &id).await?))
}

pub async fn update_rfp(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    Json(request): Json<UpdateRfpRequest>,
) -> ApiResult<Json<Rfp>> {
    let id = RfpId::from(id);
    Ok(Json(state.rfps.update(&actor, &id, request).await?))
}

pub async fn publish_rfp(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Json<Rfp>> {
    let id = RfpId::from(id);
    Ok(Json(state.rfps.publish(&actor, &id).await?))
}

/// Public view. Authentication is optional; an owner also sees drafts.
///
/// Missing credentials or a missing profile read as anonymous. Store
/// failures during the profile lookup are surfaced.
pub async fn view_rfp(
    State(state): State<AppState>,
    actor: Result<AuthActor, ApiError>,
    Path(id): Path<String>,
) -> ApiResult<Json<Rfp>> {
    let actor = match actor {
        Ok(AuthActor(actor)) => Some(actor),
        Err(ApiError::Unauthorized(_) | ApiError::Forbidden(_)) => None,
        Err(e) => return Err(e),
    };
    let id = RfpId::from(id);
    Ok(Json(state.rfps.get_public(actor.as_ref(), &id).await?))
}

/// Submit the caller's response to a published RFP.
pub async fn submit_response(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    Json(request): Json<SubmitResponseRequest>,
) -> ApiResult<Json<SubmissionReceipt>> {
    let rfp_id = RfpId::from(id);
    let response = state.responses.submit(&actor, &rfp_id, request).await?;

    Ok(Json(SubmissionReceipt {
        id: response.id.to_string(),
        rfp_id: response.rfp_id.to_string(),
        status: response.status,
        submitted_at: response.submitted_at,
    }))
}
