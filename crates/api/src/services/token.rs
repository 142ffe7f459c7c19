//! Signed session and scoped access tokens.
//!
//! Both token kinds are stateless JWTs: validity comes from the signature
//! and the embedded expiry alone, there is no server-side revocation list.
//! Session tokens assert a verified email; scoped tokens carry no identity
//! and only gate narrow capability access.

use anyhow::Result;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Session token lifetime (1 hour).
pub const SESSION_TTL_SECS: i64 = 60 * 60;

/// Scoped access token lifetime (15 minutes).
const SCOPED_TTL_SECS: i64 = 15 * 60;

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    sub: String,
    iat: i64,
    exp: i64,
}

/// Claims carried by a scoped access token. No subject claim.
#[derive(Debug, Serialize, Deserialize)]
struct ScopedClaims {
    iat: i64,
    exp: i64,
}

/// Issues and verifies signed, time-limited tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Mint a session token asserting the verified email.
    pub fn issue_session(&self, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: email.to_string(),
            iat: now,
            exp: now + SESSION_TTL_SECS,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validate a session token and return its subject. Signature mismatch,
    /// malformed structure, and elapsed expiry all collapse to None so the
    /// caller can't tell which check failed.
    pub fn verify_session(&self, token: &str) -> Option<String> {
        decode::<SessionClaims>(token, &self.decoding, &Self::validation())
            .ok()
            .map(|data| data.claims.sub)
    }

    /// Mint a scoped access token carrying no identity.
    pub fn issue_scoped(&self) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = ScopedClaims {
            iat: now,
            exp: now + SCOPED_TTL_SECS,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Validate a scoped access token: same signature and expiry check as
    /// sessions, minus the subject extraction.
    pub fn verify_scoped(&self, token: &str) -> bool {
        decode::<ScopedClaims>(token, &self.decoding, &Self::validation()).is_ok()
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-signing-secret")
    }

    #[test]
    fn session_token_round_trips_subject() {
        let tokens = service();
        let token = tokens.issue_session("a@x.com").unwrap();

        assert_eq!(tokens.verify_session(&token), Some("a@x.com".to_string()));
    }

    #[test]
    fn expired_session_token_is_rejected() {
        let tokens = service();
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: "a@x.com".to_string(),
            iat: now - 2 * SESSION_TTL_SECS,
            exp: now - SESSION_TTL_SECS,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-signing-secret"),
        )
        .unwrap();

        assert_eq!(tokens.verify_session(&token), None);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue_session("a@x.com").unwrap();

        // Flip a single character anywhere in the token
        for (i, c) in token.char_indices() {
            let replacement = if c == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(i..i + c.len_utf8(), &replacement.to_string());

            assert_eq!(tokens.verify_session(&tampered), None, "mutation at {i}");
        }
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("other-secret")
            .issue_session("a@x.com")
            .unwrap();

        assert_eq!(service().verify_session(&token), None);
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = service();

        assert_eq!(tokens.verify_session("not-a-token"), None);
        assert_eq!(tokens.verify_session(""), None);
        assert!(!tokens.verify_scoped("not-a-token"));
    }

    #[test]
    fn scoped_token_verifies_but_asserts_no_identity() {
        let tokens = service();
        let token = tokens.issue_scoped().unwrap();

        assert!(tokens.verify_scoped(&token));
        // A scoped token must not pass for a session: it has no subject.
        assert_eq!(tokens.verify_session(&token), None);
    }
}
