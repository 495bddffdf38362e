//! Sliding-window admission control
//!
//! Exposes the `RateLimiter` trait consumed by services that need a quota
//! check before performing a side effect, plus two implementations: a
//! Redis-backed sliding window for production and an in-process window for
//! tests and local development.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use uuid::Uuid;

/// Outcome of an admission check. `allowed == false` means the caller has
/// exhausted its quota for the current window; it is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitDecision {
    pub allowed: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Rate limiting configuration
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    /// Maximum number of admissions per window
    pub max_requests: u32,
    /// Length of the rolling window
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window: Duration::from_secs(60),
        }
    }
}

/// Admission-control interface. Implementations decide whether `key` may
/// perform one more operation inside the rolling window; a granted decision
/// consumes one slot.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn limit(&self, key: &str) -> Result<LimitDecision, RateLimitError>;
}

// Atomic check-and-admit over a sorted set of admission timestamps.
// KEYS[1] window key, ARGV[1] now (ms), ARGV[2] window (ms),
// ARGV[3] max admissions, ARGV[4] unique member for this attempt.
const SLIDING_WINDOW_LUA: &str = r#"
    redis.call('ZREMRANGEBYSCORE', KEYS[1], 0, ARGV[1] - ARGV[2])
    if redis.call('ZCARD', KEYS[1]) < tonumber(ARGV[3]) then
        redis.call('ZADD', KEYS[1], ARGV[1], ARGV[4])
        redis.call('PEXPIRE', KEYS[1], ARGV[2])
        return 1
    end
    return 0
"#;

/// Sliding-window limiter backed by a shared Redis instance, so the quota
/// holds across service replicas. The check and the admission are a single
/// Lua script (prevents TOCTOU between ZCARD and ZADD).
pub struct RedisSlidingWindowLimiter {
    redis: ConnectionManager,
    config: RateLimitConfig,
    script: Script,
}

impl RedisSlidingWindowLimiter {
    pub fn new(redis: ConnectionManager, config: RateLimitConfig) -> Self {
        Self {
            redis,
            config,
            script: Script::new(SLIDING_WINDOW_LUA),
        }
    }
}

#[async_trait]
impl RateLimiter for RedisSlidingWindowLimiter {
    async fn limit(&self, key: &str) -> Result<LimitDecision, RateLimitError> {
        // ConnectionManager clones share the same underlying connection
        let mut conn = self.redis.clone();
        let window_key = format!("rate_limit:{}", key);
        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);

        let admitted: i64 = self
            .script
            .key(&window_key)
            .arg(now_ms)
            .arg(self.config.window.as_millis() as i64)
            .arg(self.config.max_requests)
            .arg(Uuid::new_v4().to_string())
            .invoke_async(&mut conn)
            .await?;

        if admitted == 0 {
            tracing::debug!(%key, "admission denied by sliding window");
        }

        Ok(LimitDecision {
            allowed: admitted == 1,
        })
    }
}

/// In-process sliding window keyed by caller. Keeps one timestamp per
/// admission and evicts entries older than the window on each check.
/// Suitable for tests and single-instance deployments only: the state is
/// not shared across processes.
pub struct InMemorySlidingWindowLimiter {
    windows: Mutex<HashMap<String, VecDeque<tokio::time::Instant>>>,
    config: RateLimitConfig,
}

impl InMemorySlidingWindowLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
            config,
        }
    }
}

#[async_trait]
impl RateLimiter for InMemorySlidingWindowLimiter {
    async fn limit(&self, key: &str) -> Result<LimitDecision, RateLimitError> {
        let now = tokio::time::Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let window = windows.entry(key.to_string()).or_default();

        while let Some(oldest) = window.front() {
            if now.duration_since(*oldest) >= self.config.window {
                window.pop_front();
            } else {
                break;
            }
        }

        if window.len() < self.config.max_requests as usize {
            window.push_back(now);
            Ok(LimitDecision { allowed: true })
        } else {
            Ok(LimitDecision { allowed: false })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_three_per_minute() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window, Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn fourth_admission_in_window_is_denied() {
        let limiter = InMemorySlidingWindowLimiter::new(RateLimitConfig::default());

        for _ in 0..3 {
            assert!(limiter.limit("author-1").await.unwrap().allowed);
        }
        assert!(!limiter.limit("author-1").await.unwrap().allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_elapse_restores_quota() {
        let limiter = InMemorySlidingWindowLimiter::new(RateLimitConfig::default());

        for _ in 0..3 {
            assert!(limiter.limit("author-1").await.unwrap().allowed);
        }
        assert!(!limiter.limit("author-1").await.unwrap().allowed);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.limit("author-1").await.unwrap().allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn window_slides_rather_than_resets() {
        let limiter = InMemorySlidingWindowLimiter::new(RateLimitConfig::default());

        assert!(limiter.limit("author-1").await.unwrap().allowed);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(limiter.limit("author-1").await.unwrap().allowed);
        assert!(limiter.limit("author-1").await.unwrap().allowed);
        assert!(!limiter.limit("author-1").await.unwrap().allowed);

        // 31s later only the first admission has aged out
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(limiter.limit("author-1").await.unwrap().allowed);
        assert!(!limiter.limit("author-1").await.unwrap().allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn quotas_are_independent_per_key() {
        let limiter = InMemorySlidingWindowLimiter::new(RateLimitConfig::default());

        for _ in 0..3 {
            assert!(limiter.limit("author-1").await.unwrap().allowed);
        }
        assert!(!limiter.limit("author-1").await.unwrap().allowed);
        assert!(limiter.limit("author-2").await.unwrap().allowed);
    }
}
