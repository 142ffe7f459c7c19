//! Code-request rate limiting for Redis.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// Code requests allowed per (email, origin) pair within a window.
const REQUEST_LIMIT: i64 = 1;

/// Window length in seconds.
const WINDOW_SECS: i64 = 60;

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub allowed: bool,
    pub remaining: i64,
    /// Seconds until the current window resets.
    pub reset_secs: i64,
}

/// Rate limiter bounding how often a new code may be requested.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Admit or deny a code request for the (email, origin) pair.
    async fn admit(&self, email: &str, origin: &str) -> Result<Admission>;
}

/// Redis implementation of RateLimiter.
#[derive(Clone)]
pub struct RedisRateLimiter {
    client: redis::Client,
}

impl RedisRateLimiter {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn limit_key(email: &str, origin: &str) -> String {
        format!("otp-rate-limit:{}:{}", email, origin)
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn admit(&self, email: &str, origin: &str) -> Result<Admission> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::limit_key(email, origin);

        let current: Option<i64> = conn.get(&key).await?;
        let current = current.unwrap_or(0);

        if current >= REQUEST_LIMIT {
            let ttl: i64 = conn.ttl(&key).await?;

            return Ok(Admission {
                allowed: false,
                remaining: 0,
                reset_secs: ttl.max(0),
            });
        }

        // INCR is atomic under concurrent callers; the EXPIRE that follows
        // may race, at worst shifting the window edge slightly.
        let count: i64 = redis::cmd("INCR").arg(&key).query_async(&mut conn).await?;

        if count == 1 {
            // First request in the window - start the clock
            let _: () = redis::cmd("EXPIRE")
                .arg(&key)
                .arg(WINDOW_SECS)
                .query_async(&mut conn)
                .await?;
        }

        let ttl: i64 = conn.ttl(&key).await?;

        Ok(Admission {
            allowed: true,
            remaining: (REQUEST_LIMIT - current - 1).max(0),
            reset_secs: ttl.max(0),
        })
    }
}
