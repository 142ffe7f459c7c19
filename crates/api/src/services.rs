//! External service abstractions and orchestration.
//!
//! ## Services
//!
//! - **email** - Transactional email via Resend (prod) or SMTP (dev)
//! - **otp** - Code generation, delivery, and verification orchestration
//! - **token** - Signed session and scoped access tokens
//!
//! ## Usage in Handlers
//!
//! Services are accessed via `AppState`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let outcome = state.otp.request_code(&email, &origin).await?;
//!     let token = state.tokens.issue_session(&email)?;
//! }
//! ```

mod email;
mod otp;
mod token;

pub use email::{EmailSender, EmailSenderImpl};
pub use otp::{CodeRequest, OtpService, normalize_email};
pub use token::{SESSION_TTL_SECS, TokenService};

#[cfg(test)]
pub use email::MockEmailSender;
