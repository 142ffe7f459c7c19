//! One-time code orchestration.

use std::sync::Arc;

use anyhow::Result;
use rand::Rng;

use super::email::{EmailSender, otp_email};
use crate::stores::{OtpStore, RateLimiter};

/// Digits in a generated code.
const CODE_LENGTH: usize = 6;

/// Outcome of a code request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRequest {
    /// Code generated, stored, and handed to email delivery.
    Accepted,
    /// Denied by the rate limiter; retry once the window resets.
    RateLimited { retry_after_secs: i64 },
}

/// Generates, delivers, and verifies one-time codes.
///
/// Owns the code store, the rate limiter, and the email collaborator.
/// Session tokens are deliberately not minted here: the route layer asks
/// the token service after a successful verification.
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn OtpStore>,
    limiter: Arc<dyn RateLimiter>,
    email: Arc<dyn EmailSender>,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn OtpStore>,
        limiter: Arc<dyn RateLimiter>,
        email: Arc<dyn EmailSender>,
    ) -> Self {
        Self {
            store,
            limiter,
            email,
        }
    }

    /// Request a new code for an email address.
    ///
    /// The rate limiter fails open: when it is unreachable the request is
    /// admitted and a degraded-mode event is logged. The code store does
    /// not: a storage failure aborts the request.
    pub async fn request_code(&self, email: &str, origin: &str) -> Result<CodeRequest> {
        let email = normalize_email(email);

        match self.limiter.admit(&email, origin).await {
            Ok(admission) if !admission.allowed => {
                return Ok(CodeRequest::RateLimited {
                    retry_after_secs: admission.reset_secs,
                });
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(
                    email = %email,
                    origin = %origin,
                    event = "auth:otp:limiter:degraded",
                    "rate limiter unreachable, failing open: {err:#}"
                );
            }
        }

        let code = generate_code();

        self.store.store(&email, &code).await?;
        self.email.send(&email, &otp_email(&code)).await?;

        tracing::info!(
            email = %email,
            origin = %origin,
            event = "auth:otp:requested",
            "verification code requested"
        );

        Ok(CodeRequest::Accepted)
    }

    /// Check a submitted code against the stored record. Attempt bounding
    /// happens in the store; the request-rate limiter plays no part here.
    pub async fn verify_code(&self, email: &str, code: &str) -> Result<bool> {
        let email = normalize_email(email);

        self.store.verify(&email, code).await
    }
}

/// Emails are keyed and compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// A fixed-length numeric code. Each digit is drawn independently, so the
/// distribution is uniform over the full range including leading zeros.
fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| rng.random_range(0..10).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockEmailSender;
    use crate::stores::{Admission, MockOtpStore, MockRateLimiter};
    use mockall::predicate::eq;

    fn admit_all() -> MockRateLimiter {
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

    fn service(
        store: MockOtpStore,
        limiter: MockRateLimiter,
        email: MockEmailSender,
    ) -> OtpService {
        OtpService::new(Arc::new(store), Arc::new(limiter), Arc::new(email))
    }

    #[test]
    fn generated_codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email(" User@Example.COM "), "user@example.com");
    }

    #[tokio::test]
    async fn request_code_stores_and_delivers() {
        let mut store = MockOtpStore::new();
        store
            .expect_store()
            .withf(|email, code| email == "user@example.com" && code.len() == 6)
            .returning(|_, _| Ok(()));

        let mut email = MockEmailSender::new();
        email
            .expect_send()
            .withf(|to, rendered| to == "user@example.com" && !rendered.text.is_empty())
            .returning(|_, _| Ok(()));

        let outcome = service(store, admit_all(), email)
            .request_code("User@Example.com", "203.0.113.9")
            .await
            .unwrap();

        assert_eq!(outcome, CodeRequest::Accepted);
    }

    #[tokio::test]
    async fn request_code_denied_carries_window_reset() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_admit()
            .with(eq("user@example.com"), eq("203.0.113.9"))
            .returning(|_, _| {
                Ok(Admission {
                    allowed: false,
                    remaining: 0,
                    reset_secs: 42,
                })
            });

        // No store or email expectations: a denied request touches neither.
        let outcome = service(MockOtpStore::new(), limiter, MockEmailSender::new())
            .request_code("user@example.com", "203.0.113.9")
            .await
            .unwrap();

        assert_eq!(
            outcome,
            CodeRequest::RateLimited {
                retry_after_secs: 42
            }
        );
    }

    #[tokio::test]
    async fn request_code_fails_open_when_limiter_unreachable() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_admit()
            .returning(|_, _| Err(anyhow::anyhow!("connection refused")));

        let mut store = MockOtpStore::new();
        store.expect_store().returning(|_, _| Ok(()));

        let mut email = MockEmailSender::new();
        email.expect_send().returning(|_, _| Ok(()));

        let outcome = service(store, limiter, email)
            .request_code("user@example.com", "203.0.113.9")
            .await
            .unwrap();

        assert_eq!(outcome, CodeRequest::Accepted);
    }

    #[tokio::test]
    async fn request_code_fails_closed_on_store_failure() {
        let mut store = MockOtpStore::new();
        store
            .expect_store()
            .returning(|_, _| Err(anyhow::anyhow!("redis down")));

        // No email expectation: nothing is sent without a stored code.
        let result = service(store, admit_all(), MockEmailSender::new())
            .request_code("user@example.com", "203.0.113.9")
            .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn verify_code_normalizes_the_email_key() {
        let mut store = MockOtpStore::new();
        store
            .expect_verify()
            .with(eq("user@example.com"), eq("123456"))
            .returning(|_, _| Ok(true));

        let verified = service(store, MockRateLimiter::new(), MockEmailSender::new())
            .verify_code(" User@EXAMPLE.com", "123456")
            .await
            .unwrap();

        assert!(verified);
    }
}
