use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::ApiError;
use super::ApiSuccess;
use super::CredentialsRequestBody;
use crate::account::models::RegisterCommand;
use crate::account::models::SafeProfile;
use crate::inbound::http::router::AppState;

pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<CredentialsRequestBody>, JsonRejection>,
) -> Result<ApiSuccess<SafeProfile>, ApiError> {
    let Json(body) = body?;

    let command = RegisterCommand::new(body.email, body.password)?;

    state
        .account_service
        .register(command)
        .await
        .map_err(ApiError::from)
        .map(|profile| ApiSuccess::new(StatusCode::CREATED, profile))
}
