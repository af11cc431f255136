use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::response::Response;

use super::errors::ApiError;
use crate::admission::AdmissionDecision;
use crate::inbound::http::router::AppState;

const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_CLIENT: &str = "unknown";

/// Middleware that counts each request against the caller's budget before
/// anything else runs.
pub async fn admit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client = client_key(&request, state.trust_forwarded_for);

    match state.admission.check(&client).await {
        AdmissionDecision::Admitted { .. } => Ok(next.run(request).await),
        AdmissionDecision::Rejected { retry_after } => {
            let policy = state.admission.policy();
            Err(ApiError::AdmissionRejected {
                client,
                limit: policy.max_requests,
                window: policy.window,
                retry_after,
            })
        }
    }
}

/// Identify the caller: the first `X-Forwarded-For` entry when trusted,
/// otherwise the peer IP.
pub fn client_key(request: &Request, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = request
            .headers()
            .get(FORWARDED_FOR)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(forwarded) = forwarded {
            return forwarded.to_string();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}
