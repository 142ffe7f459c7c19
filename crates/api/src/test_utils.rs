//! Shared test utilities for API handler tests.
//!
//! Provides a flexible `TestStateBuilder` for constructing `AppState`
//! instances with only the mocks needed for each test.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::TestStateBuilder;
//!
//! let mut store = MockOtpStore::new();
//! store.expect_verify().returning(|_, _| Ok(true));
//!
//! let state = TestStateBuilder::new()
//!     .with_otp_store(store)
//!     .build();
//! ```

use std::sync::Arc;

use crate::config::Config;
use crate::services::{MockEmailSender, OtpService, TokenService};
use crate::state::AppState;
use crate::stores::{Admission, MockOtpStore, MockRateLimiter};

pub const TEST_JWT_SECRET: &str = "test-signing-secret";

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        redis_url: "redis://test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        smtp_url: None,
        resend_api_key: None,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default mocks for any store/service not explicitly set, so tests
/// only configure what they exercise. The default rate limiter admits
/// everything; the default store and email sender reject any call.
pub struct TestStateBuilder {
    otp_store: Option<MockOtpStore>,
    rate_limiter: Option<MockRateLimiter>,
    email_sender: Option<MockEmailSender>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            otp_store: None,
            rate_limiter: None,
            email_sender: None,
        }
    }

    pub fn with_otp_store(mut self, store: MockOtpStore) -> Self {
        self.otp_store = Some(store);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: MockRateLimiter) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn with_email_sender(mut self, sender: MockEmailSender) -> Self {
        self.email_sender = Some(sender);
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let otp = OtpService::new(
            Arc::new(self.otp_store.unwrap_or_else(MockOtpStore::new)),
            Arc::new(self.rate_limiter.unwrap_or_else(default_rate_limiter)),
            Arc::new(self.email_sender.unwrap_or_else(MockEmailSender::new)),
        );

        AppState {
            config: test_config(),
            redis: redis::Client::open("redis://127.0.0.1").expect("static redis url"),
            otp,
            tokens: TokenService::new(TEST_JWT_SECRET),
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Default limiter that admits everything with a fresh window.
fn default_rate_limiter() -> MockRateLimiter {
    let mut limiter = MockRateLimiter::new();
    limiter.expect_admit().returning(|_, _| {
        Ok(Admission {
            allowed: true,
            remaining: 0,
            reset_secs: 60,
        })
    });
    limiter
}
