//! Identity propagation for protected routes.
//!
//! Runs on every request to a protected path. Extracts a bearer token from
//! the `Authorization` header (falling back to the `synaptiq-token` cookie),
//! validates it, and attaches the verified subject plus best-effort
//! anonymous hints to the request for downstream handlers:
//!
//! - `x-user-email` header + [`VerifiedUser`] extension when the token is valid
//! - `x-user-id` / `x-user-type` headers from unauthenticated cookies
//!
//! An invalid or missing token does not reject the request here. Handlers
//! that need a verified session take the [`AuthUser`] extractor and fail
//! closed with 401 themselves.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, StatusCode, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::state::AppState;

/// Cookie fallback for the session token.
const TOKEN_COOKIE: &str = "synaptiq-token";
/// Unauthenticated, client-chosen identifiers.
const USER_ID_COOKIE: &str = "synaptiq-user-id";
const USER_TYPE_COOKIE: &str = "synaptiq-user-type";

/// Paths served behind the identity gateway.
const PROTECTED_PREFIXES: &[&str] = &["/api/", "/auth/me"];

/// Whether a path gets identity propagation.
pub fn requires_identity(path: &str) -> bool {
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Verified subject attached to the request after token validation.
#[derive(Debug, Clone)]
pub struct VerifiedUser {
    pub email: String,
}

/// Attaches identity context to protected requests, then forwards them.
pub async fn propagate_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if !requires_identity(request.uri().path()) {
        return next.run(request).await;
    }

    // Client-supplied identity headers are never trusted.
    request.headers_mut().remove("x-user-email");
    request.headers_mut().remove("x-user-id");
    request.headers_mut().remove("x-user-type");

    let jar = CookieJar::from_headers(request.headers());

    if let Some(token) = bearer_token(&request)
        .or_else(|| jar.get(TOKEN_COOKIE).map(|c| c.value().to_string()))
        && let Some(email) = state.tokens.verify_session(&token)
    {
        if let Ok(value) = HeaderValue::from_str(&email) {
            request.headers_mut().insert("x-user-email", value);
        }
        request.extensions_mut().insert(VerifiedUser { email });
    }

    // Best-effort hints so handlers can tell anonymous from verified
    // traffic without re-parsing cookies.
    for (header_name, cookie_name) in [
        ("x-user-id", USER_ID_COOKIE),
        ("x-user-type", USER_TYPE_COOKIE),
    ] {
        let hint = jar
            .get(cookie_name)
            .map(|c| c.value().to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        if let Ok(value) = HeaderValue::from_str(&hint) {
            request.headers_mut().insert(header_name, value);
        }
    }

    next.run(request).await
}

fn bearer_token(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.to_string())
}

/// Requires a verified session. Handlers taking this extractor fail closed
/// when the gateway attached no identity.
pub struct AuthUser {
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<VerifiedUser>()
            .map(|user| AuthUser {
                email: user.email.clone(),
            })
            .ok_or(AuthError::Unverified)
    }
}

pub enum AuthError {
    Unverified,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Unverified => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
        };

        let body = serde_json::json!({ "error": message });

        (status, Json(body)).into_response()
    }
}
