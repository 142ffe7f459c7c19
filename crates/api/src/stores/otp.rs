//! One-time code storage for Redis.

use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;

/// How long a stored code stays valid.
pub const OTP_TTL_SECS: i64 = 10 * 60;

/// Verification attempts allowed before the record is invalidated.
pub const MAX_ATTEMPTS: u32 = 5;

/// Store for one-time code operations.
///
/// A store failure is a hard error for both operations: without durable
/// storage the code cannot be trusted, so callers must not fall back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OtpStore: Send + Sync {
    /// Store a code for an email with the standard TTL, replacing any
    /// previous unconsumed record.
    async fn store(&self, email: &str, code: &str) -> Result<()>;

    /// Check a submitted code. Consumes the record on success, counts the
    /// attempt on failure. Absent or expired records verify as false.
    async fn verify(&self, email: &str, submitted: &str) -> Result<bool>;
}

/// Live record for an email, mapped from the fields of the `otp:{email}`
/// hash. Serialization stays at this boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
struct OtpRecord {
    code: String,
    attempts: u32,
}

/// What to do with a submitted code given the live record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Attempts exhausted; delete the record without checking the code.
    Lockout,
    /// Code matches; consume the record.
    Accept,
    /// Wrong code; count the attempt and keep the record.
    Reject,
}

fn judge(record: &OtpRecord, submitted: &str) -> Verdict {
    if record.attempts >= MAX_ATTEMPTS {
        Verdict::Lockout
    } else if record.code == submitted {
        Verdict::Accept
    } else {
        Verdict::Reject
    }
}

/// Redis implementation of OtpStore.
#[derive(Clone)]
pub struct RedisOtpStore {
    client: redis::Client,
}

impl RedisOtpStore {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    fn otp_key(email: &str) -> String {
        format!("otp:{}", email)
    }
}

#[async_trait]
impl OtpStore for RedisOtpStore {
    async fn store(&self, email: &str, code: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::otp_key(email);

        let _: () = conn
            .hset_multiple(&key, &[("otp", code), ("attempts", "0")])
            .await?;
        let _: () = conn.expire(&key, OTP_TTL_SECS).await?;

        Ok(())
    }

    async fn verify(&self, email: &str, submitted: &str) -> Result<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let key = Self::otp_key(email);

        let code: Option<String> = conn.hget(&key, "otp").await?;
        let Some(code) = code else {
            // Never issued, or expired.
            return Ok(false);
        };

        let attempts: Option<u32> = conn.hget(&key, "attempts").await?;
        let record = OtpRecord {
            code,
            attempts: attempts.unwrap_or(0),
        };

        match judge(&record, submitted) {
            Verdict::Lockout => {
                let _: () = conn.del(&key).await?;
                Ok(false)
            }
            Verdict::Accept => {
                let _: () = conn.del(&key).await?;
                Ok(true)
            }
            Verdict::Reject => {
                let _: i64 = conn.hincr(&key, "attempts", 1).await?;
                Ok(false)
            }
        }
    }
}
