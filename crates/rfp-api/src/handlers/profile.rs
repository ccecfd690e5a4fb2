//! Profile (onboarding) handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use rfp_models::{OnboardProfileRequest, Profile};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::state::AppState;

/// Get the caller's profile.
pub async fn get_me(State(state): State<AppState>, user: AuthUser) -> ApiResult<Json<Profile>> {
    let profile = state.profiles.get(&user).await?;
    Ok(Json(profile))
}

/// Choose a role for the caller. Allowed once per account.
pub async fn put_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<OnboardProfileRequest>,
) -> ApiResult<(StatusCode, Json<Profile>)> {
    let profile = state.profiles.onboard(&user, request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}
