//! Admission control
//!
//! Per-client request budgets checked before any other request processing.

use std::time::Duration;

use async_trait::async_trait;

/// Fixed-window admission policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Maximum requests admitted per client in one window
    pub max_requests: u32,
    /// Window length
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted { .. })
    }
}

/// Whole seconds a rejected client should wait, rounded up and never zero.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after.as_secs();
    let secs = if retry_after.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    };
    secs.max(1)
}

/// Port for per-client admission control.
///
/// `check` counts the request against the client's budget; the
/// check-and-increment must be atomic across concurrent requests.
#[async_trait]
pub trait AdmissionController: Send + Sync + 'static {
    /// Policy in force, reported to rejected clients.
    fn policy(&self) -> RateLimitPolicy;

    /// Count one request for `client` and decide whether it may proceed.
    async fn check(&self, client: &str) -> AdmissionDecision;
}
