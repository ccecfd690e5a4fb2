//! Response review handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use rfp_models::{RejectResponseRequest, ResponseId, RfpId, RfpResponse};

use crate::auth::AuthActor;
use crate::error::ApiResult;
use crate::state::AppState;

/// Query for the buyer's response listing.
#[derive(Debug, Deserialize)]
pub struct ListResponsesQuery {
    #[serde(default)]
    pub rfp_id: Option<String>,
}

/// Responses across the caller's RFPs, optionally narrowed to one.
pub async fn list_responses(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Query(query): Query<ListResponsesQuery>,
) -> ApiResult<Json<Vec<RfpResponse>>> {
    let rfp_id = query
        .rfp_id
        .filter(|id| !id.trim().is_empty())
        .map(RfpId::from);
    Ok(Json(state.responses.list_for_buyer(&actor, rfp_id.as_ref()).await?))
}

pub async fn list_my_responses(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> ApiResult<Json<Vec<RfpResponse>>> {
    Ok(Json(state.responses.list_own(&actor).await?))
}

pub async fn get_response(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Json<RfpResponse>> {
    let id = ResponseId::from(id);
    Ok(Json(state.responses.get_detail(&actor, &id).await?))
}

pub async fn start_review(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Json<RfpResponse>> {
    let id = ResponseId::from(id);
    Ok(Json(state.responses.start_review(&actor, &id).await?))
}

pub async fn approve_response(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
) -> ApiResult<Json<RfpResponse>> {
    let id = ResponseId::from(id);
    Ok(Json(state.responses.approve(&actor, &id).await?))
}

/// Reject with a reason. A missing body is treated as a missing reason.
pub async fn reject_response(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(id): Path<String>,
    body: Option<Json<RejectResponseRequest>>,
) -> ApiResult<Json<RfpResponse>> {
    let id = ResponseId::from(id);
    let reason = body.and_then(|Json(request)| request.rejection_reason);
    Ok(Json(
        state
            .responses
            .reject(&actor, &id, reason.as_deref())
            .await?,
    ))
}
