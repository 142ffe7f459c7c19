//! Email sending abstraction.
//!
//! Uses Resend in production, SMTP (lettre) in development.
//! This allows local development without a Resend account.

use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    Message, SmtpTransport, Transport,
    message::{Mailbox, MultiPart},
};
use resend_rs::types::CreateEmailBaseOptions;

const FROM_NAME: &str = "Synaptiq";
const FROM_ADDRESS: &str = "auth@synaptiq.ai";

/// A rendered message: subject plus text and HTML alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders the one-time code email.
pub fn otp_email(code: &str) -> RenderedEmail {
    let subject = "Your Synaptiq Verification Code".to_string();

    let text = format!(
        "Your verification code for Synaptiq is: {code}\n\n\
         This code will expire in 10 minutes and can only be used once.\n\
         If you didn't request this code, please ignore this email.\n\n\
         - The Synaptiq Team\n"
    );

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <style>
    body {{ font-family: Arial, sans-serif; color: #333; max-width: 600px; margin: 0 auto; }}
    .code {{ font-size: 32px; font-weight: bold; letter-spacing: 5px; text-align: center; margin: 30px 0; }}
    .footer {{ margin-top: 30px; font-size: 12px; color: #666; text-align: center; }}
  </style>
</head>
<body>
  <p>Use this code to sign in to Synaptiq:</p>
  <div class="code">{code}</div>
  <p>This code will expire in 10 minutes and can only be used once.</p>
  <p class="footer">If you didn't request this code, you can safely ignore this email.</p>
</body>
</html>
"#
    );

    RenderedEmail {
        subject,
        text,
        html,
    }
}

/// Email delivery abstraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a rendered message to an address.
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()>;
}

/// Email sender backed by either Resend or SMTP.
pub enum EmailSenderImpl {
    /// SMTP-based sender using lettre (for development)
    Smtp(SmtpSender),
    /// Resend API sender (for production)
    Resend(ResendSender),
}

impl EmailSenderImpl {
    /// Create a new email sender based on config.
    /// Uses Resend if an api key is provided, otherwise falls back to SMTP.
    pub fn new(resend_api_key: Option<String>, smtp_url: Option<String>) -> Result<Self> {
        if let Some(api_key) = resend_api_key.filter(|k| !k.is_empty()) {
            Ok(Self::Resend(ResendSender::new(api_key)))
        } else if let Some(url) = smtp_url.filter(|u| !u.is_empty()) {
            Ok(Self::Smtp(SmtpSender::new(url)?))
        } else {
            anyhow::bail!("Either RESEND_API_KEY or SMTP_URL must be configured")
        }
    }
}

#[async_trait]
impl EmailSender for EmailSenderImpl {
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        match self {
            Self::Resend(sender) => sender.send(to, email).await,
            Self::Smtp(sender) => sender.send(to, email),
        }
    }
}

/// SMTP sender using lettre.
pub struct SmtpSender {
    transport: SmtpTransport,
}

impl SmtpSender {
    pub fn new(smtp_url: String) -> Result<Self> {
        let transport = SmtpTransport::from_url(&smtp_url)?.build();

        Ok(Self { transport })
    }

    pub fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        let message = Message::builder()
            .from(Mailbox::new(
                Some(FROM_NAME.to_owned()),
                FROM_ADDRESS.parse()?,
            ))
            .to(Mailbox::new(None, to.parse()?))
            .subject(email.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                email.text.clone(),
                email.html.clone(),
            ))?;

        self.transport.send(&message)?;

        Ok(())
    }
}

/// Resend API sender.
pub struct ResendSender {
    client: resend_rs::Resend,
}

impl ResendSender {
    pub fn new(api_key: String) -> Self {
        Self {
            client: resend_rs::Resend::new(&api_key),
        }
    }

    pub async fn send(&self, to: &str, email: &RenderedEmail) -> Result<()> {
        let message = CreateEmailBaseOptions::new(
            format!("{} <{}>", FROM_NAME, FROM_ADDRESS),
            [to],
            email.subject.as_str(),
        )
        .with_text(&email.text)
        .with_html(&email.html);

        self.client.emails.send(message).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_email_carries_code_in_both_bodies() {
        let email = otp_email("042137");

        assert!(email.text.contains("042137"));
        assert!(email.html.contains("042137"));
        assert_eq!(email.subject, "Your Synaptiq Verification Code");
    }

    #[test]
    fn sender_requires_a_configured_backend() {
        assert!(EmailSenderImpl::new(None, None).is_err());
        assert!(EmailSenderImpl::new(Some(String::new()), Some(String::new())).is_err());
    }
}
