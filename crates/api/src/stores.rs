//! Ephemeral stores (Redis).
//!
//! This module contains traits and implementations for ephemeral data storage.
//! All data stored here has automatic TTL-based expiration.
//!
//! ## Stores
//!
//! - **otp** - One-time codes with attempt counters (10 min TTL)
//! - **rate_limit** - Per-(email, origin) code request counters (60s window)
//!
//! ## Redis Key Patterns
//!
//! ```text
//! otp:{email}                       → Hash {otp, attempts}
//! otp-rate-limit:{email}:{origin}   → Code request counter
//! ```
//!
//! ## Usage
//!
//! Stores are owned by the OTP service, which is the only caller:
//!
//! ```ignore
//! let otp = OtpService::new(
//!     Arc::new(RedisOtpStore::new(redis.clone())),
//!     Arc::new(RedisRateLimiter::new(redis.clone())),
//!     Arc::new(email),
//! );
//! ```

mod otp;
mod rate_limit;

pub use otp::{OtpStore, RedisOtpStore};
pub use rate_limit::{Admission, RateLimiter, RedisRateLimiter};

#[cfg(test)]
pub use otp::MockOtpStore;
#[cfg(test)]
pub use rate_limit::MockRateLimiter;
