use auth::Identity;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::SafeProfile;
use crate::inbound::http::router::AppState;

/// Profile of the authenticated caller. Served on `/auth/profile` and
/// `/users/me`.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<ApiSuccess<SafeProfile>, ApiError> {
    state
        .account_service
        .get_profile(&identity)
        .await
        .map_err(ApiError::from)
        .map(|profile| ApiSuccess::new(StatusCode::OK, profile))
}
