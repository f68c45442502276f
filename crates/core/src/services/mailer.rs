//! Outbound email.
//!
//! SMTP delivery is optional. Without an email config the mailer logs
//! the message instead of sending, which keeps password resets and
//! notification emails usable in development.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use quill_common::{AppError, AppResult, EmailConfig};
use tracing::info;

/// Mailer service.
#[derive(Clone)]
pub struct MailerService {
    config: Option<EmailConfig>,
}

impl MailerService {
    /// Create a new mailer. A `None` config disables delivery.
    #[must_use]
    pub const fn new(config: Option<EmailConfig>) -> Self {
        Self { config }
    }

    /// Create a disabled mailer.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { config: None }
    }

    /// Whether SMTP delivery is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Send a password reset token to a user.
    pub async fn send_password_reset(
        &self,
        to: &str,
        username: &str,
        token: &str,
    ) -> AppResult<()> {
        let subject = "Reset your password";
        let body = format!(
            "Hi {username},\n\n\
             A password reset was requested for your account.\n\
             Use this token to set a new password: {token}\n\n\
             If you did not request this, you can ignore this email."
        );
        self.send(to, subject, &body).await
    }

    /// Send a notification email.
    pub async fn send_notification(&self, to: &str, message: &str) -> AppResult<()> {
        self.send(to, "New activity on your account", message).await
    }

    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        let Some(ref config) = self.config else {
            info!(to = %to, subject = %subject, "Email delivery disabled, logging instead");
            return Ok(());
        };

        let message = Message::builder()
            .from(
                config
                    .from_address
                    .parse()
                    .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?,
            )
            .to(to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::ExternalService(format!("SMTP relay error: {e}")))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let transport = builder.build();
        transport
            .send(message)
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to send email: {e}")))?;

        info!(to = %to, subject = %subject, "Sent email");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_mailer_logs_and_succeeds() {
        let mailer = MailerService::disabled();
        assert!(!mailer.is_enabled());

        mailer
            .send_password_reset("alice@example.com", "alice", "token123")
            .await
            .unwrap();
    }
}
