use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::EmailConfig;
use crate::domain::auth::models::EmailAddress;
use crate::domain::auth::ports::Mailer;
use crate::auth::errors::MailerError;

/// SMTP mailer for password reset emails.
///
/// When no SMTP host or username is configured the mailer runs in no-op
/// mode and logs the reset link instead of sending it, so local
/// development works without mail infrastructure.
pub struct SmtpMailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Mailbox,
    reset_base_url: String,
}

impl SmtpMailer {
    /// Build the mailer from configuration.
    ///
    /// # Arguments
    /// * `config` - SMTP relay settings and the reset link base URL
    ///
    /// # Errors
    /// * `BuildFailed` - From address is invalid or the relay could not be configured
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let from_address = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| MailerError::BuildFailed(format!("Invalid from address: {}", e)))?;

        let transport = if config.smtp_host.is_empty() || config.smtp_username.is_empty() {
            tracing::warn!("SMTP not configured; password reset emails will only be logged");
            None
        } else {
            let transport =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                    .map_err(|e| MailerError::BuildFailed(e.to_string()))?
                    .port(config.smtp_port)
                    .credentials(Credentials::new(
                        config.smtp_username.clone(),
                        config.smtp_password.clone(),
                    ))
                    .build();
            Some(transport)
        };

        Ok(Self {
            transport,
            from_address,
            reset_base_url: config.reset_base_url.clone(),
        })
    }

    fn reset_link(&self, token: &str) -> String {
        format!("{}?token={}", self.reset_base_url, token)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_reset_email(
        &self,
        to: &EmailAddress,
        reset_token: &str,
    ) -> Result<(), MailerError> {
        let link = self.reset_link(reset_token);

        let transport = match &self.transport {
            Some(transport) => transport,
            None => {
                tracing::info!("Password reset link for {}: {}", to.as_str(), link);
                return Ok(());
            }
        };

        let recipient = to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| MailerError::BuildFailed(format!("Invalid recipient address: {}", e)))?;

        let body = format!(
            "We received your password reset request.\n\n\
             Please click the following link to reset your password:\n{}\n\n\
             This link will expire in 1 hour.\n\
             If you did not request this, please ignore this email.",
            link
        );

        let message = Message::builder()
            .from(self.from_address.clone())
            .to(recipient)
            .subject("Password Reset Request")
            .body(body)
            .map_err(|e| MailerError::BuildFailed(e.to_string()))?;

        transport
            .send(message)
            .await
            .map_err(|e| MailerError::SendFailed(e.to_string()))?;

        tracing::info!("Password reset email sent to {}", to.as_str());

        Ok(())
    }
}
