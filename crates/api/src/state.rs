use crate::{
    config::Config,
    services::{OtpService, TokenService},
};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Redis client, used by health checks; stores hold their own handle.
    pub redis: redis::Client,
    /// One-time code orchestration.
    pub otp: OtpService,
    /// Session and scoped access token signing.
    pub tokens: TokenService,
}
