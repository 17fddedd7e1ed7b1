//! Shared types for the HTTP layer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::core_state::CoreState;

const WINDOW: Duration = Duration::from_secs(60);
/// Clean stale keys once the map grows past this.
const MAX_TRACKED_KEYS: usize = 10_000;

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        let per_minute = core.config.rate_limit_per_minute;
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(per_minute))),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// User context — injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, inserted into request extensions by the auth
/// middleware. `token` is the raw bearer token (needed for logout).
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

// ═══════════════════════════════════════════════════════════
// Rate limiter — sliding one-minute window per key
// ═══════════════════════════════════════════════════════════

pub struct RateLimiter {
    windows: HashMap<String, Vec<Instant>>,
    per_minute: u32,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            windows: HashMap::new(),
            per_minute: per_minute.max(1),
        }
    }

    /// `Ok(())` or `Err(retry_after_secs)` when the key is over its limit.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> Result<(), u64> {
        if self.windows.len() > MAX_TRACKED_KEYS {
            self.windows
                .retain(|_, hits| hits.last().is_some_and(|t| now.duration_since(*t) < WINDOW));
        }

        let hits = self.windows.entry(key.to_string()).or_default();
        hits.retain(|t| now.duration_since(*t) < WINDOW);

        if hits.len() as u32 >= self.per_minute {
            let oldest = hits.first().copied().unwrap_or(now);
            let wait = WINDOW.saturating_sub(now.duration_since(oldest));
            return Err(wait.as_secs().max(1));
        }

        hits.push(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let mut limiter = RateLimiter::new(3);
        let now = Instant::now();
        for _ in 0..3 {
            assert!(limiter.check_at("ip:1", now).is_ok());
        }
        let retry = limiter.check_at("ip:1", now).unwrap_err();
        assert!((1..=60).contains(&retry));
    }

    #[test]
    fn keys_are_independent() {
        let mut limiter = RateLimiter::new(1);
        let now = Instant::now();
        assert!(limiter.check_at("a", now).is_ok());
        assert!(limiter.check_at("b", now).is_ok());
        assert!(limiter.check_at("a", now).is_err());
    }

    #[test]
    fn window_slides() {
        let mut limiter = RateLimiter::new(1);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at("k", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let mut limiter = RateLimiter::new(0);
        assert!(limiter.check("k").is_ok());
        assert!(limiter.check("k").is_err());
    }
}
