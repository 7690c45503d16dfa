//! Per-address rate admission.

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{RateAlgorithm, RateLimitConfig};
use crate::error::GateError;
use crate::http::response::reject;
use crate::observability::metrics;

/// Answer of a limiter for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Denied { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

/// A keyed admission controller.
///
/// Updates for one key are atomic; different keys never contend on a
/// global lock.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, key: &str) -> RateDecision;

    /// Forget keys idle for longer than the limiter's idle TTL.
    /// Returns how many were evicted.
    fn sweep(&self) -> usize;

    fn tracked_keys(&self) -> usize;
}

struct Window {
    started: Instant,
    count: u32,
    last_seen: Instant,
}

/// At most `limit` requests per key in each fixed window.
pub struct FixedWindowLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
    window: Duration,
    idle_ttl: Duration,
}

impl FixedWindowLimiter {
    pub fn new(limit: u32, window: Duration, idle_ttl: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
            idle_ttl,
        }
    }
}

impl RateLimiter for FixedWindowLimiter {
    fn allow(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let mut entry = self.windows.entry(key.to_string()).or_insert_with(|| Window {
            started: now,
            count: 0,
            last_seen: now,
        });
        let window = entry.value_mut();

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }
        window.last_seen = now;

        if window.count < self.limit {
            window.count += 1;
            RateDecision::Allowed
        } else {
            let elapsed = now.duration_since(window.started);
            RateDecision::Denied {
                retry_after: self.window.saturating_sub(elapsed).max(Duration::from_millis(1)),
            }
        }
    }

    fn sweep(&self) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| w.last_seen.elapsed() < self.idle_ttl);
        before.saturating_sub(self.windows.len())
    }

    fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Longest retry-after reported. A bucket that never refills reports this.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// A token bucket per key.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    /// Take one token, or report how long until one is available.
    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> Result<(), Duration> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let wait = if refill_rate > 0.0 {
                Duration::try_from_secs_f64((1.0 - self.tokens) / refill_rate)
                    .unwrap_or(MAX_RETRY_AFTER)
            } else {
                MAX_RETRY_AFTER
            };
            Err(wait.clamp(Duration::from_millis(1), MAX_RETRY_AFTER))
        }
    }
}

/// Bursts of up to `capacity` requests, refilled at `refill_per_sec`.
pub struct TokenBucketLimiter {
    buckets: DashMap<String, TokenBucket>,
    capacity: f64,
    refill_per_sec: f64,
    idle_ttl: Duration,
}

impl TokenBucketLimiter {
    /// A non-positive or non-finite `refill_per_sec` means buckets never
    /// refill once drained.
    pub fn new(capacity: u32, refill_per_sec: f64, idle_ttl: Duration) -> Self {
        let refill_per_sec = if refill_per_sec.is_finite() && refill_per_sec > 0.0 {
            refill_per_sec
        } else {
            tracing::warn!(refill_per_sec, "Token bucket refill rate is not positive; buckets will not refill");
            0.0
        };

        Self {
            buckets: DashMap::new(),
            capacity: capacity as f64,
            refill_per_sec,
            idle_ttl,
        }
    }
}

impl RateLimiter for TokenBucketLimiter {
    fn allow(&self, key: &str) -> RateDecision {
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));

        match bucket.try_acquire(self.capacity, self.refill_per_sec) {
            Ok(()) => RateDecision::Allowed,
            Err(retry_after) => RateDecision::Denied { retry_after },
        }
    }

    fn sweep(&self) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, b| b.last_update.elapsed() < self.idle_ttl);
        before.saturating_sub(self.buckets.len())
    }

    fn tracked_keys(&self) -> usize {
        self.buckets.len()
    }
}

/// The rate gate's state. A disabled admission lets everything through.
#[derive(Clone)]
pub struct RateAdmission {
    limiter: Option<Arc<dyn RateLimiter>>,
}

impl RateAdmission {
    pub fn new(limiter: Arc<dyn RateLimiter>) -> Self {
        Self {
            limiter: Some(limiter),
        }
    }

    pub fn disabled() -> Self {
        Self { limiter: None }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let window = Duration::from_secs(config.window_secs);
        let idle_ttl = Duration::from_secs(config.idle_ttl_secs);
        let limiter: Arc<dyn RateLimiter> = match config.algorithm {
            RateAlgorithm::FixedWindow => Arc::new(FixedWindowLimiter::new(
                config.requests_per_window,
                window,
                idle_ttl,
            )),
            RateAlgorithm::TokenBucket => Arc::new(TokenBucketLimiter::new(
                config.burst_size,
                config.requests_per_window as f64 / window.as_secs_f64(),
                idle_ttl,
            )),
        };
        Self::new(limiter)
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub fn allow(&self, key: &str) -> RateDecision {
        match &self.limiter {
            Some(limiter) => limiter.allow(key),
            None => RateDecision::Allowed,
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.limiter.as_ref().map_or(0, |l| l.tracked_keys())
    }

    /// Periodically evict idle keys until shutdown. No task when disabled.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Option<JoinHandle<()>> {
        let limiter = self.limiter.clone()?;

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = limiter.sweep();
                        let tracked = limiter.tracked_keys();
                        metrics::record_rate_limit_keys(tracked);
                        if evicted > 0 {
                            tracing::debug!(evicted, tracked, "Evicted idle rate-limit keys");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Rate-limit sweeper stopping");
                        break;
                    }
                }
            }
        }))
    }
}

/// Middleware admitting requests per client IP.
pub async fn rate_limit(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(admission): State<RateAdmission>,
    request: Request,
    next: Next,
) -> Response {
    let key = addr.ip().to_string();

    match admission.allow(&key) {
        RateDecision::Allowed => next.run(request).await,
        RateDecision::Denied { retry_after } => {
            metrics::record_rate_limited();
            let err = GateError::RateLimitExceeded { retry_after };
            tracing::warn!(client = %key, retry_after = ?retry_after, "Rate limit exceeded");
            reject(&request, &err, err.outcome())
        }
    }
}
