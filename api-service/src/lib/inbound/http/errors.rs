use std::time::Duration;

use auth::JwtError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;

use super::normalizer::classify;
use super::normalizer::Fault;
use crate::account::errors::AccountError;

/// Every failure the HTTP pipeline can raise.
///
/// Variants carry detail for server-side logs; what a client sees is decided
/// by the normalizer alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Per-field messages, in field order
    Validation(Vec<String>),
    InvalidCredentials,
    MissingToken,
    TokenInvalid(String),
    TokenExpired,
    NotFound(String),
    DuplicateEmail(String),
    AdmissionRejected {
        client: String,
        limit: u32,
        window: Duration,
        retry_after: Duration,
    },
    /// Framework rejection that keeps its own status, e.g. an oversized body
    Rejected(StatusCode),
    Unclassified(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let fault = Fault::Failure(self);
        let mut response = classify(&fault).status.into_response();
        response.extensions_mut().insert(fault);
        response
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(messages) => ApiError::Validation(messages),
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::DuplicateEmail(email) => ApiError::DuplicateEmail(email),
            AccountError::NotFound(_) => ApiError::NotFound("Account not found".to_string()),
            AccountError::Store(_) | AccountError::Internal(_) => {
                ApiError::Unclassified(err.to_string())
            }
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::TokenExpired => ApiError::TokenExpired,
            JwtError::InvalidToken(reason) => ApiError::TokenInvalid(reason),
            JwtError::WeakSecret { .. } | JwtError::EncodingFailed(_) => {
                ApiError::Unclassified(err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonSyntaxError(_)
            | JsonRejection::JsonDataError(_)
            | JsonRejection::MissingJsonContentType(_) => {
                ApiError::Validation(vec![rejection.body_text()])
            }
            _ => ApiError::Rejected(rejection.status()),
        }
    }
}
