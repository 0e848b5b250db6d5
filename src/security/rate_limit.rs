//! Fixed-window rate limiting.
//!
//! # Responsibilities
//! - Count requests per opaque key inside a fixed window
//! - Lazily sweep expired windows, at most once per sweep interval
//! - Reject exhausted keys with `RATE_LIMITED` and a retry hint
//!
//! # Design Decisions
//! - Per-key check-then-increment runs under the map's entry lock
//! - A denied call does not increment
//! - Single process only; state resets on restart

use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::{mapref::entry::Entry, DashMap};
use std::net::SocketAddr;

use crate::config::RateLimitRuleConfig;
use crate::error::AccessError;
use crate::http::server::AppState;
use crate::observability::metrics;

/// Default interval between sweeps of expired windows.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One rate-limit query.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRequest<'a> {
    pub key: &'a str,
    pub limit: u32,
    pub window: Duration,
}

/// Outcome of a rate-limit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: Instant,
}

impl RateLimitDecision {
    /// Time until the window resets, zero if already elapsed.
    pub fn retry_after(&self, now: Instant) -> Duration {
        self.reset_at.saturating_duration_since(now)
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

/// Process-wide fixed-window counters.
pub struct RateLimiter {
    windows: DashMap<String, Window>,
    sweep_interval: Duration,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            windows: DashMap::new(),
            sweep_interval,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Count one request for `request.key` at the current instant.
    pub fn check(&self, request: RateLimitRequest<'_>) -> RateLimitDecision {
        self.check_at(request, Instant::now())
    }

    /// Count one request for `request.key` at `now`.
    pub fn check_at(&self, request: RateLimitRequest<'_>, now: Instant) -> RateLimitDecision {
        self.maybe_sweep(now);

        let RateLimitRequest { key, limit, window } = request;
        if limit == 0 {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                reset_at: now + window,
            };
        }

        match self.windows.entry(key.to_owned()) {
            Entry::Vacant(vacant) => {
                let reset_at = now + window;
                vacant.insert(Window { count: 1, reset_at });
                RateLimitDecision {
                    allowed: true,
                    remaining: limit - 1,
                    reset_at,
                }
            }
            Entry::Occupied(mut occupied) => {
                let current = occupied.get_mut();
                if now >= current.reset_at {
                    current.count = 1;
                    current.reset_at = now + window;
                } else if current.count < limit {
                    current.count += 1;
                } else {
                    return RateLimitDecision {
                        allowed: false,
                        remaining: 0,
                        reset_at: current.reset_at,
                    };
                }
                RateLimitDecision {
                    allowed: true,
                    remaining: limit.saturating_sub(current.count),
                    reset_at: current.reset_at,
                }
            }
        }
    }

    /// Remove every window whose reset instant has passed.
    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| w.reset_at > now);
        let removed = before.saturating_sub(self.windows.len());
        metrics::record_rate_limit_entries(self.windows.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.windows.len(), "Swept expired rate-limit windows");
        }
        removed
    }

    /// Number of keys currently tracked (including logically expired ones not yet swept).
    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }

    fn maybe_sweep(&self, now: Instant) {
        {
            let mut last = self.last_sweep.lock().unwrap_or_else(|e| e.into_inner());
            if now.saturating_duration_since(*last) < self.sweep_interval {
                return;
            }
            *last = now;
        }
        self.sweep_at(now);
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

/// Name of the rule protecting authentication endpoints.
pub const AUTH_RULE: &str = "auth";
/// Name of the rule protecting other mutating API calls.
pub const MUTATION_RULE: &str = "mutation";

/// Pick the rule for a request, if any applies.
fn select_rule<'a>(
    path: &str,
    mutating: bool,
    auth: &'a RateLimitRuleConfig,
    mutation: &'a RateLimitRuleConfig,
) -> Option<(&'static str, &'a RateLimitRuleConfig)> {
    if path.starts_with("/api/auth/") {
        Some((AUTH_RULE, auth))
    } else if mutating && path.starts_with("/api/") {
        Some((MUTATION_RULE, mutation))
    } else {
        None
    }
}

/// Window key for one client under one rule.
fn limiter_key(client: &str, rule: &str) -> String {
    format!("{client}:{rule}")
}

/// Middleware applying the configured rules, keyed by rule and client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let rules = {
        let config = state.config.load();
        let limits = &config.rate_limit;
        limits.enabled.then_some((limits.auth, limits.mutation))
    };
    let Some((auth, mutation)) = rules else {
        return next.run(request).await;
    };

    let mutating = !request.method().is_safe();
    let Some((rule, limits)) = select_rule(request.uri().path(), mutating, &auth, &mutation) else {
        return next.run(request).await;
    };

    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let key = limiter_key(&client, rule);

    let decision = state.rate_limiter.check(RateLimitRequest {
        key: &key,
        limit: limits.limit,
        window: Duration::from_millis(limits.window_ms),
    });

    if !decision.allowed {
        tracing::warn!(key = %key, rule, "Rate limit exceeded");
        metrics::record_rate_limited(rule);
        return AccessError::RateLimited {
            retry_after: decision.retry_after(Instant::now()),
        }
        .into_response();
    }

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&decision.remaining.to_string()) {
        response.headers_mut().insert("x-ratelimit-remaining", value);
    }
    response
}
