use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::admission::admit;
use super::handlers::get_profile::get_profile;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::not_found::not_found;
use super::handlers::register::register;
use super::middleware::authenticate as auth_middleware;
use super::normalizer::handle_panic;
use super::normalizer::normalize_errors;
use crate::account::ports::AccountServicePort;
use crate::admission::AdmissionController;

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub authenticator: Arc<Authenticator>,
    pub admission: Arc<dyn AdmissionController>,
    pub trust_forwarded_for: bool,
}

/// Build the application router.
///
/// Middleware order, outermost first: CORS, tracing, error normalization,
/// panic catching, admission control, then the bearer guard on protected
/// routes only.
pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    authenticator: Arc<Authenticator>,
    admission: Arc<dyn AdmissionController>,
    trust_forwarded_for: bool,
) -> Router {
    let state = AppState {
        account_service,
        authenticator,
        admission,
        trust_forwarded_for,
    };

    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register));

    let protected_routes = Router::new()
        .route("/auth/profile", get(get_profile))
        .route("/users/me", get(get_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), admit))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(middleware::from_fn(normalize_errors))
        .layer(trace_layer)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
