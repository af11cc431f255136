use axum::extract::Request;
use axum::extract::State;
use axum::http::header;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::errors::ApiError;
use crate::inbound::http::router::AppState;

/// Middleware that verifies the bearer token and attaches the caller's
/// `auth::Identity` to the request extensions.
///
/// On any failure the handler does not run.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(req.headers())?;

    let identity = state.authenticator.validate_token(token)?;

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header.
///
/// # Errors
/// * `MissingToken` - Header absent or empty
/// * `TokenInvalid` - Header is not a bearer credential
pub fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let value = match headers.get(header::AUTHORIZATION) {
        Some(value) => value,
        None => return Err(ApiError::MissingToken),
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::TokenInvalid("Authorization header is not ASCII".to_string()))?
        .trim();

    if value.is_empty() {
        return Err(ApiError::MissingToken);
    }

    let (scheme, token) = value.split_once(' ').unwrap_or((value, ""));

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(ApiError::TokenInvalid(
            "Expected: Bearer <token>".to_string(),
        ));
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::MissingToken);
    }

    Ok(token)
}
