//! Email-based passwordless authentication.
//!
//! Flow:
//! 1. User requests a code via POST /auth/request-code with their email
//! 2. A 6-digit code is generated, stored in Redis keyed by the email, and
//!    sent to the user's inbox
//! 3. User submits email + code to POST /auth/verify-code
//! 4. The code is checked against the stored record; wrong guesses are
//!    counted and the record is consumed on success or after 5 failures
//! 5. A signed session token is returned; clients attach it as a bearer
//!    token on protected requests
//!
//! Security notes:
//! - Code requests are rate limited per (email, origin) pair
//! - Codes expire after 10 minutes; guessing is bounded by the attempt
//!   counter, not the request-rate limiter
//! - Invalid, expired, and exhausted codes all produce the same 401
//! - The code value itself is never logged

use axum::{
    Json, Router, debug_handler,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use garde::Validate;
use shared::api::{
    MeResponse, RequestCodePayload, RequestCodeResponse, SessionTokenResponse, VerifyCodePayload,
    VerifyCodeResponse,
};

use crate::{
    error::AppError,
    middleware::identity::AuthUser,
    services::{CodeRequest, SESSION_TTL_SECS, normalize_email},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/request-code", post(request_code))
        .route("/verify-code", post(verify_code))
        .route("/session-token", get(session_token))
        .route("/me", get(get_me))
}

/// Best-effort network origin for rate limiting. Proxies set
/// x-forwarded-for; a missing header means a direct connection.
fn caller_origin(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[debug_handler]
async fn request_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RequestCodePayload>,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let origin = caller_origin(&headers);

    match state.otp.request_code(&payload.email, &origin).await? {
        CodeRequest::Accepted => Ok(Json(RequestCodeResponse {
            success: true,
            message: "Verification code sent".to_string(),
        })),
        CodeRequest::RateLimited { retry_after_secs } => {
            tracing::warn!(
                email = %payload.email,
                origin = %origin,
                event = "auth:otp:rate-limited",
                "code request rate limited"
            );

            Err(AppError::RateLimited { retry_after_secs })
        }
    }
}

#[debug_handler]
async fn verify_code(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<VerifyCodePayload>,
) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let origin = caller_origin(&headers);

    if !state.otp.verify_code(&payload.email, &payload.code).await? {
        tracing::warn!(
            email = %payload.email,
            origin = %origin,
            event = "auth:otp:verification:failed",
            "verification failed"
        );

        return Err(AppError::External(
            StatusCode::UNAUTHORIZED,
            "Invalid or expired code",
        ));
    }

    // Token issuance is the route layer's job, not the OTP service's.
    let subject = normalize_email(&payload.email);
    let token = state.tokens.issue_session(&subject)?;

    tracing::info!(
        email = %subject,
        origin = %origin,
        event = "auth:otp:verification:success",
        "verification succeeded"
    );

    Ok(Json(VerifyCodeResponse {
        success: true,
        token,
        subject,
        expires_in: SESSION_TTL_SECS,
    }))
}

/// Issues the scope-limited access token. It carries no identity claim and
/// needs no prior verification; it only gates narrow capability access.
#[debug_handler]
async fn session_token(State(state): State<AppState>) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    let token = state.tokens.issue_scoped()?;

    Ok(Json(SessionTokenResponse { token }))
}

async fn get_me(user: AuthUser) -> Result<impl IntoResponse + std::fmt::Debug, AppError> {
    Ok(Json(MeResponse { email: user.email }))
}
