//! Failure normalization
//!
//! The outermost application middleware. Every failed request, whatever
//! raised it, leaves through here as exactly one [`ErrorEnvelope`].

use std::any::Any;

use axum::extract::Request;
use axum::http::header;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Json;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;

use super::errors::ApiError;
use crate::admission::retry_after_secs;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid credentials";
pub const BEARER_TOKEN_MESSAGE: &str = "Invalid or missing bearer token";
pub const DUPLICATE_EMAIL_MESSAGE: &str = "Email is already registered";
pub const TOO_MANY_REQUESTS_MESSAGE: &str = "Too Many Requests. Please try again later.";
pub const UNCLASSIFIED_MESSAGE: &str = "Internal server error";
pub const UNKNOWN_ERROR_MESSAGE: &str = "Internal Server Error";

/// Failure carried from where it was raised to the normalizer, in the
/// response extensions.
#[derive(Debug, Clone)]
pub enum Fault {
    /// A failure from the declared taxonomy
    Failure(ApiError),
    /// Anything else, such as a caught panic; holds the raw value for logs
    Unrecognized(String),
}

/// `message` is a single string, or the ordered list of validation messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvelopeMessage {
    Text(String),
    List(Vec<String>),
}

/// The only failure body ever sent to a client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: EnvelopeMessage,
    pub error: String,
    pub timestamp: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Client-facing classification of a failure
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub status: StatusCode,
    pub error: String,
    pub message: EnvelopeMessage,
    pub details: Option<Value>,
}

impl Classification {
    fn new(status: StatusCode, error: &str, message: EnvelopeMessage) -> Self {
        Self {
            status,
            error: error.to_string(),
            message,
            details: None,
        }
    }

    fn text(status: StatusCode, error: &str, message: &str) -> Self {
        Self::new(status, error, EnvelopeMessage::Text(message.to_string()))
    }

    /// Render the envelope for a request path at a given instant.
    pub fn into_envelope(self, path: String, now: DateTime<Utc>) -> ErrorEnvelope {
        ErrorEnvelope {
            status_code: self.status.as_u16(),
            message: self.message,
            error: self.error,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            path,
            details: self.details,
        }
    }
}

/// Map a fault to its status, category and client-visible message.
///
/// Internal detail carried by the fault (store errors, token rejection
/// reasons, panic payloads) never reaches the classification.
pub fn classify(fault: &Fault) -> Classification {
    let error = match fault {
        Fault::Failure(error) => error,
        Fault::Unrecognized(_) => {
            return Classification::text(
                StatusCode::INTERNAL_SERVER_ERROR,
                "UnknownError",
                UNKNOWN_ERROR_MESSAGE,
            )
        }
    };

    match error {
        ApiError::AdmissionRejected {
            limit,
            window,
            retry_after,
            ..
        } => Classification {
            details: Some(json!({
                "limit": limit,
                "windowSeconds": window.as_secs(),
                "retryAfter": retry_after_secs(*retry_after),
            })),
            ..Classification::text(
                StatusCode::TOO_MANY_REQUESTS,
                "TooManyRequests",
                TOO_MANY_REQUESTS_MESSAGE,
            )
        },
        ApiError::Validation(messages) => Classification::new(
            StatusCode::BAD_REQUEST,
            "BadRequest",
            EnvelopeMessage::List(messages.clone()),
        ),
        ApiError::InvalidCredentials => Classification::text(
            StatusCode::UNAUTHORIZED,
            "Unauthorized",
            INVALID_CREDENTIALS_MESSAGE,
        ),
        ApiError::MissingToken | ApiError::TokenInvalid(_) | ApiError::TokenExpired => {
            Classification::text(StatusCode::UNAUTHORIZED, "Unauthorized", BEARER_TOKEN_MESSAGE)
        }
        ApiError::NotFound(message) => {
            Classification::text(StatusCode::NOT_FOUND, "NotFound", message)
        }
        ApiError::DuplicateEmail(_) => {
            Classification::text(StatusCode::CONFLICT, "Conflict", DUPLICATE_EMAIL_MESSAGE)
        }
        ApiError::Rejected(status) => classify_bare(*status),
        ApiError::Unclassified(_) => Classification::text(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unclassified",
            UNCLASSIFIED_MESSAGE,
        ),
    }
}

/// Classify an error response the framework produced on its own.
///
/// Client errors keep their status and use the reason phrase; server errors
/// are treated as unrecognized faults.
pub fn classify_bare(status: StatusCode) -> Classification {
    if status.is_server_error() {
        return classify(&Fault::Unrecognized(format!("bare {} response", status)));
    }

    let reason = status.canonical_reason().unwrap_or("Error");
    let category: String = reason.chars().filter(|c| c.is_ascii_alphanumeric()).collect();

    Classification::text(status, &category, reason)
}

/// Middleware that turns every failed response into an [`ErrorEnvelope`].
pub async fn normalize_errors(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let response = next.run(request).await;
    let status = response.status();

    let fault = response.extensions().get::<Fault>().cloned();
    if fault.is_none() && !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let classification = match &fault {
        Some(fault) => {
            log_fault(fault, method.as_str(), &path);
            classify(fault)
        }
        None => {
            let classification = classify_bare(status);
            if status.is_server_error() {
                tracing::error!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    "Unstructured server error response"
                );
            } else {
                tracing::debug!(
                    method = %method,
                    path = %path,
                    status = status.as_u16(),
                    "Framework rejected request"
                );
            }
            classification
        }
    };

    let retry_after = match &fault {
        Some(Fault::Failure(ApiError::AdmissionRejected { retry_after, .. })) => {
            Some(retry_after_secs(*retry_after))
        }
        _ => None,
    };

    let envelope_status = classification.status;
    let envelope = classification.into_envelope(path, Utc::now());
    let mut rendered = (envelope_status, Json(envelope)).into_response();

    // Keep headers such as Allow from the original response
    let (parts, _body) = response.into_parts();
    for (name, value) in parts.headers.iter() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }

    if let Some(seconds) = retry_after {
        rendered
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(seconds));
    }

    rendered
}

fn log_fault(fault: &Fault, method: &str, path: &str) {
    match fault {
        Fault::Failure(ApiError::AdmissionRejected { client, limit, .. }) => {
            tracing::warn!(client = %client, method, path, limit, "Rate limit exceeded");
        }
        Fault::Failure(ApiError::InvalidCredentials) => {
            tracing::info!(method, path, "Login rejected");
        }
        Fault::Failure(ApiError::MissingToken) => {
            tracing::info!(method, path, "Bearer token missing");
        }
        Fault::Failure(ApiError::TokenInvalid(reason)) => {
            tracing::warn!(method, path, reason = %reason, "Bearer token invalid");
        }
        Fault::Failure(ApiError::TokenExpired) => {
            tracing::info!(method, path, "Bearer token expired");
        }
        Fault::Failure(ApiError::Unclassified(detail)) => {
            tracing::error!(method, path, detail = %detail, "Request failed");
        }
        Fault::Failure(error) => {
            tracing::debug!(method, path, error = ?error, "Request rejected");
        }
        Fault::Unrecognized(detail) => {
            tracing::error!(method, path, detail = %detail, "Unrecognized fault");
        }
    }
}

/// Panic handler for `CatchPanicLayer`; the normalizer renders the result.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "panic with non-string payload".to_string()
    };

    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(Fault::Unrecognized(detail));
    response
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::HeaderMap;
    use axum::http::Method;
    use axum::http::Request;
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use chrono::TimeZone;
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    use super::*;

    #[test]
    fn test_classify_declared_mapping() {
        let cases = vec![
            (ApiError::Validation(vec!["x".to_string()]), 400, "BadRequest"),
            (ApiError::InvalidCredentials, 401, "Unauthorized"),
            (ApiError::MissingToken, 401, "Unauthorized"),
            (ApiError::TokenInvalid("bad".to_string()), 401, "Unauthorized"),
            (ApiError::TokenExpired, 401, "Unauthorized"),
            (ApiError::NotFound("Account not found".to_string()), 404, "NotFound"),
            (ApiError::DuplicateEmail("a@b.co".to_string()), 409, "Conflict"),
            (ApiError::Rejected(StatusCode::PAYLOAD_TOO_LARGE), 413, "PayloadTooLarge"),
            (ApiError::Unclassified("db down".to_string()), 500, "Unclassified"),
        ];

        for (error, status, category) in cases {
            let classification = classify(&Fault::Failure(error.clone()));
            assert_eq!(classification.status.as_u16(), status, "{:?}", error);
            assert_eq!(classification.error, category, "{:?}", error);
            assert!(classification.details.is_none());
        }
    }

    #[test]
    fn test_token_failures_share_message() {
        let messages: Vec<_> = [
            ApiError::MissingToken,
            ApiError::TokenInvalid("InvalidSignature".to_string()),
            ApiError::TokenExpired,
        ]
        .into_iter()
        .map(|e| classify(&Fault::Failure(e)).message)
        .collect();

        assert!(messages
            .iter()
            .all(|m| *m == EnvelopeMessage::Text(BEARER_TOKEN_MESSAGE.to_string())));
    }

    #[test]
    fn test_unclassified_hides_detail() {
        let classification = classify(&Fault::Failure(ApiError::Unclassified(
            "connection refused to 10.0.0.5:5432".to_string(),
        )));
        assert_eq!(
            classification.message,
            EnvelopeMessage::Text(UNCLASSIFIED_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_admission_rejection_details() {
        let classification = classify(&Fault::Failure(ApiError::AdmissionRejected {
            client: "10.0.0.1".to_string(),
            limit: 3,
            window: Duration::from_secs(60),
            retry_after: Duration::from_millis(41_200),
        }));

        assert_eq!(classification.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(classification.error, "TooManyRequests");
        assert_eq!(
            classification.details,
            Some(json!({"limit": 3, "windowSeconds": 60, "retryAfter": 42}))
        );
    }

    #[test]
    fn test_unrecognized_fault() {
        let classification = classify(&Fault::Unrecognized("index out of bounds".to_string()));
        assert_eq!(classification.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(classification.error, "UnknownError");
        assert_eq!(
            classification.message,
            EnvelopeMessage::Text(UNKNOWN_ERROR_MESSAGE.to_string())
        );
    }

    #[test]
    fn test_classify_bare_responses() {
        let classification = classify_bare(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(classification.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(classification.error, "MethodNotAllowed");
        assert_eq!(
            classification.message,
            EnvelopeMessage::Text("Method Not Allowed".to_string())
        );

        let classification = classify_bare(StatusCode::BAD_GATEWAY);
        assert_eq!(classification.error, "UnknownError");
        assert_eq!(classification.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_envelope_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let envelope = classify(&Fault::Failure(ApiError::Validation(vec![
            "email must be a valid email address".to_string(),
            "password must be at least 8 characters long".to_string(),
        ])))
        .into_envelope("/auth/register".to_string(), now);

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({
                "statusCode": 400,
                "message": [
                    "email must be a valid email address",
                    "password must be at least 8 characters long"
                ],
                "error": "BadRequest",
                "timestamp": "2024-05-01T12:30:00.000Z",
                "path": "/auth/register"
            })
        );
    }

    async fn failing() -> Result<&'static str, ApiError> {
        Err(ApiError::Unclassified("store exploded".to_string()))
    }

    async fn rejected() -> Result<&'static str, ApiError> {
        Err(ApiError::AdmissionRejected {
            client: "10.0.0.1".to_string(),
            limit: 3,
            window: Duration::from_secs(60),
            retry_after: Duration::from_secs(30),
        })
    }

    async fn panics() -> &'static str {
        panic!("handler bug")
    }

    fn app() -> Router {
        Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/failing", get(failing))
            .route("/rejected", get(rejected))
            .route("/panics", get(panics))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn(normalize_errors))
    }

    async fn call(method: Method, uri: &str) -> (StatusCode, HeaderMap, Value) {
        let response = app()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, headers, body)
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let response = app()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }

    #[tokio::test]
    async fn test_failure_rendered_once() {
        let (status, headers, body) = call(Method::GET, "/failing?trace=1").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert_eq!(body["error"], "Unclassified");
        assert_eq!(body["message"], UNCLASSIFIED_MESSAGE);
        assert_eq!(body["path"], "/failing?trace=1");
        assert!(!body.to_string().contains("store exploded"));
    }

    #[tokio::test]
    async fn test_rejection_sets_retry_after() {
        let (status, headers, body) = call(Method::GET, "/rejected").await;

        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(headers.get(header::RETRY_AFTER).unwrap(), "30");
        assert_eq!(body["details"]["retryAfter"], 30);
        assert_eq!(body["details"]["limit"], 3);
    }

    #[tokio::test]
    async fn test_panic_becomes_unknown_error() {
        let (status, _, body) = call(Method::GET, "/panics").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "UnknownError");
        assert_eq!(body["message"], UNKNOWN_ERROR_MESSAGE);
        assert!(!body.to_string().contains("handler bug"));
    }

    #[tokio::test]
    async fn test_method_not_allowed_wrapped() {
        let (status, headers, body) = call(Method::DELETE, "/ok").await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert!(headers.get(header::ALLOW).is_some());
        assert_eq!(body["statusCode"], 405);
        assert_eq!(body["error"], "MethodNotAllowed");
    }
}
