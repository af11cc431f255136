//! In-memory admission controller
//!
//! Fixed-window request counting per client key. Counters live in process
//! memory, so each replica enforces its own budget.

use std::collections::HashMap;
use std::time::Duration;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::admission::AdmissionController;
use crate::admission::AdmissionDecision;
use crate::admission::RateLimitPolicy;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: Instant,
    count: u32,
}

#[derive(Debug)]
struct Counters {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// Fixed-window rate limiter keyed by client identifier
#[derive(Debug)]
pub struct InMemoryRateLimiter {
    policy: RateLimitPolicy,
    counters: Mutex<Counters>,
}

impl InMemoryRateLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            counters: Mutex::new(Counters {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Check and count a request at an explicit instant.
    ///
    /// A rejected request is not counted, so a client that keeps retrying
    /// stays rejected exactly until its window ends.
    pub async fn check_at(&self, client: &str, now: Instant) -> AdmissionDecision {
        let mut counters = self.counters.lock().await;
        counters.maybe_sweep(now, self.policy.window);

        let window = counters
            .windows
            .entry(client.to_string())
            .or_insert(Window {
                started_at: now,
                count: 0,
            });

        if now.saturating_duration_since(window.started_at) >= self.policy.window {
            *window = Window {
                started_at: now,
                count: 0,
            };
        }

        if window.count >= self.policy.max_requests {
            let resets_at = window.started_at + self.policy.window;
            return AdmissionDecision::Rejected {
                retry_after: resets_at.saturating_duration_since(now),
            };
        }

        window.count += 1;
        AdmissionDecision::Admitted {
            remaining: self.policy.max_requests - window.count,
        }
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.counters.lock().await.windows.len()
    }
}

impl Counters {
    fn maybe_sweep(&mut self, now: Instant, window: Duration) {
        if now.saturating_duration_since(self.last_sweep) < window {
            return;
        }

        self.last_sweep = now;
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started_at) < window);
    }
}

#[async_trait]
impl AdmissionController for InMemoryRateLimiter {
    fn policy(&self) -> RateLimitPolicy {
        self.policy
    }

    async fn check(&self, client: &str) -> AdmissionDecision {
        self.check_at(client, Instant::now()).await
    }
}
