//! Request throttling and bookkeeping for the FIPE client.

use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Sliding-window rate limiter: at most `max_requests` per `window`.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    /// Start times of the requests inside the current window, oldest first
    sent: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`.
    ///
    /// A `max_requests` of zero is treated as one.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        let max_requests = max_requests.max(1);
        Self {
            max_requests,
            window,
            sent: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Wait until a request may be sent, then record it.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut sent = self.sent.lock().await;
                let now = Instant::now();

                while let Some(&oldest) = sent.front() {
                    if now.duration_since(oldest) >= self.window {
                        sent.pop_front();
                    } else {
                        break;
                    }
                }

                if sent.len() < self.max_requests {
                    sent.push_back(now);
                    return;
                }

                sent.front().map_or(Duration::ZERO, |&oldest| {
                    self.window.saturating_sub(now.duration_since(oldest))
                })
            };

            tracing::trace!("Rate limit window full, waiting {:?}", wait);
            tokio::time::sleep(wait).await;
        }
    }
}

/// Counters describing the requests a client has made.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestStats {
    /// Requests sent, including retries
    pub total_requests: u64,
    /// Requests answered with a success status
    pub succeeded: u64,
    /// Requests answered with HTTP 429
    pub rate_limited: u64,
    /// Requests that failed for any other reason
    pub failed: u64,
    /// Requests sent per endpoint
    pub by_endpoint: BTreeMap<String, u64>,
}

impl RequestStats {
    /// Record that a request to `endpoint` is being sent.
    pub fn record_attempt(&mut self, endpoint: &str) {
        self.total_requests += 1;
        *self.by_endpoint.entry(endpoint.to_string()).or_insert(0) += 1;
    }

    /// Fraction of sent requests that succeeded, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.total_requests as f64
        }
    }
}
