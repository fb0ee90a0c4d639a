//! Rate limiting for authentication endpoints.
//!
//! In-memory per-key attempt counters over a fixed-anchor window: the window
//! starts at the first attempt for a key and resets once it elapses. Once a
//! key reaches the limit, further attempts are rejected without incrementing,
//! so the counter never exceeds the limit under concurrency.

use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::auth::extract_client_ip;
use crate::cli::IpExtractor;

/// Attempt budget for one endpoint.
#[derive(Debug, Clone, Copy)]
pub struct RatePolicy {
    /// Maximum attempts per window.
    pub max_attempts: u32,
    /// Window duration, anchored at the first attempt.
    pub window: Duration,
}

/// Login: 10 attempts per 15 minutes per client IP.
pub const LOGIN_POLICY: RatePolicy = RatePolicy {
    max_attempts: 10,
    window: Duration::from_secs(15 * 60),
};

/// Forgot-password: 5 attempts per 15 minutes per client IP.
pub const FORGOT_PASSWORD_POLICY: RatePolicy = RatePolicy {
    max_attempts: 5,
    window: Duration::from_secs(15 * 60),
};

/// Registration: 3 attempts per 15 minutes per client IP.
pub const REGISTER_POLICY: RatePolicy = RatePolicy {
    max_attempts: 3,
    window: Duration::from_secs(15 * 60),
};

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// Attempt counted; `remaining` attempts left in the current window.
    Allowed { remaining: u32 },
    /// Limit reached; retry once the window resets.
    Limited { retry_after: Duration },
}

struct Window {
    count: u32,
    started_at: Instant,
}

/// Keyed attempt counter with a single policy.
pub struct RateLimiter {
    policy: RatePolicy,
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new(policy: RatePolicy) -> Self {
        Self {
            policy,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for `key` and decide whether it is allowed.
    /// Increment-and-check runs under the lock, so concurrent attempts for
    /// the same key never admit more than `max_attempts` per window.
    pub fn check(&self, key: &str) -> RateDecision {
        let mut windows = self.windows.lock();
        let now = Instant::now();

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started_at: now,
        });

        // Reset window if expired
        if now.duration_since(window.started_at) >= self.policy.window {
            window.count = 0;
            window.started_at = now;
        }

        if window.count >= self.policy.max_attempts {
            let reset_at = window.started_at + self.policy.window;
            return RateDecision::Limited {
                retry_after: reset_at.saturating_duration_since(now),
            };
        }

        window.count += 1;
        RateDecision::Allowed {
            remaining: self.policy.max_attempts - window.count,
        }
    }

    /// Drop windows idle for at least two window lengths. Returns the number
    /// of purged keys.
    pub fn cleanup(&self) -> usize {
        let mut windows = self.windows.lock();
        let now = Instant::now();
        let ttl = self.policy.window * 2;

        let before = windows.len();
        windows.retain(|_, window| now.duration_since(window.started_at) < ttl);
        before - windows.len()
    }
}

/// One limiter per rate-limited endpoint, so windows never interfere.
#[derive(Clone)]
pub struct RateLimits {
    pub login: Arc<RateLimiter>,
    pub register: Arc<RateLimiter>,
    pub forgot_password: Arc<RateLimiter>,
}

impl RateLimits {
    pub fn new() -> Self {
        Self {
            login: Arc::new(RateLimiter::new(LOGIN_POLICY)),
            register: Arc::new(RateLimiter::new(REGISTER_POLICY)),
            forgot_password: Arc::new(RateLimiter::new(FORGOT_PASSWORD_POLICY)),
        }
    }

    /// Purge idle windows across all limiters.
    pub fn cleanup(&self) -> usize {
        self.login.cleanup() + self.register.cleanup() + self.forgot_password.cleanup()
    }
}

impl Default for RateLimits {
    fn default() -> Self {
        Self::new()
    }
}

/// State for the rate-limiting middlewares.
#[derive(Clone)]
pub struct RateLimitState {
    pub limits: RateLimits,
    pub ip_extractor: Option<IpExtractor>,
}

async fn enforce(
    limiter: &RateLimiter,
    ip_extractor: Option<&IpExtractor>,
    request: Request,
    next: Next,
    message: &'static str,
) -> Response {
    let ip = match extract_client_ip(&request, ip_extractor) {
        Ok(ip) => ip,
        Err(_) => {
            return (StatusCode::FORBIDDEN, "Unable to determine client IP.").into_response();
        }
    };

    match limiter.check(&ip) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            let secs = retry_after.as_secs().max(1);
            warn!(ip = %ip, retry_after_secs = secs, "Rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::RETRY_AFTER, secs.to_string())],
                Json(serde_json::json!({
                    "error": message,
                    "retry_after_seconds": secs,
                })),
            )
                .into_response()
        }
    }
}

/// Middleware for rate limiting login.
pub async fn rate_limit_login(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &state.limits.login,
        state.ip_extractor.as_ref(),
        request,
        next,
        "Too many login attempts. Please wait before trying again.",
    )
    .await
}

/// Middleware for rate limiting registration.
pub async fn rate_limit_register(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &state.limits.register,
        state.ip_extractor.as_ref(),
        request,
        next,
        "Too many signup attempts. Please wait before trying again.",
    )
    .await
}

/// Middleware for rate limiting password reset requests.
pub async fn rate_limit_forgot_password(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(
        &state.limits.forgot_password,
        state.ip_extractor.as_ref(),
        request,
        next,
        "Too many password reset requests. Please wait before trying again.",
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_attempts: u32, window: Duration) -> RatePolicy {
        RatePolicy {
            max_attempts,
            window,
        }
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let limiter = RateLimiter::new(policy(3, Duration::from_secs(60)));

        let decisions: Vec<bool> = (0..4)
            .map(|_| matches!(limiter.check("key"), RateDecision::Allowed { .. }))
            .collect();

        assert_eq!(decisions, vec![true, true, true, false]);
    }

    #[test]
    fn test_rejection_does_not_consume_attempts() {
        let limiter = RateLimiter::new(policy(2, Duration::from_secs(60)));

        limiter.check("key");
        limiter.check("key");

        // Repeated rejections keep reporting the same window reset.
        for _ in 0..5 {
            assert!(matches!(
                limiter.check("key"),
                RateDecision::Limited { .. }
            ));
        }
    }

    #[test]
    fn test_window_reset_allows_again() {
        let limiter = RateLimiter::new(policy(2, Duration::from_millis(50)));

        limiter.check("key");
        limiter.check("key");
        assert!(matches!(limiter.check("key"), RateDecision::Limited { .. }));

        std::thread::sleep(Duration::from_millis(80));

        assert!(matches!(
            limiter.check("key"),
            RateDecision::Allowed { .. }
        ));
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(policy(1, Duration::from_secs(60)));

        assert!(matches!(
            limiter.check("alice"),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("bob"),
            RateDecision::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check("alice"),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn test_concurrent_attempts_admit_exactly_the_limit() {
        let limiter = Arc::new(RateLimiter::new(policy(10, Duration::from_secs(60))));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    matches!(limiter.check("key"), RateDecision::Allowed { .. })
                })
            })
            .collect();

        let allowed = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|allowed| *allowed)
            .count();

        assert_eq!(allowed, 10);
    }

    #[test]
    fn test_cleanup_purges_idle_windows() {
        let limiter = RateLimiter::new(policy(3, Duration::from_millis(10)));

        limiter.check("key");
        std::thread::sleep(Duration::from_millis(30));

        assert_eq!(limiter.cleanup(), 1);
        assert_eq!(limiter.cleanup(), 0);
    }
}
