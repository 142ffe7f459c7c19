//! Shared API request/response types used by the auth service and its clients.

use garde::Validate;
use serde::{Deserialize, Serialize};

/// Request a one-time code to be sent to an email address.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RequestCodePayload {
    #[garde(email)]
    pub email: String,
}

/// Returned when a code request was accepted for delivery.
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestCodeResponse {
    pub success: bool,
    pub message: String,
}

/// Submit the one-time code received via email.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct VerifyCodePayload {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 6, max = 6), pattern(r"^[0-9]+$"))]
    pub code: String,
}

/// Returned after successful verification, contains the session token for
/// protected requests.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub token: String,
    /// The verified email the token asserts.
    pub subject: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// Returned by the scoped access token endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionTokenResponse {
    pub token: String,
}

/// Identity of the verified session, as seen by protected handlers.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub email: String,
}
