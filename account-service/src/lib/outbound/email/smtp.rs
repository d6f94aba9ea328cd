use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::AsyncSmtpTransport;
use lettre::AsyncTransport;
use lettre::Message;
use lettre::Tokio1Executor;

use crate::config::EmailConfig;
use crate::config::SmtpConfig;
use crate::domain::user::models::EmailMessage;
use crate::user::errors::DeliveryError;
use crate::user::ports::EmailSender;

/// Plain-text mail over an authenticated STARTTLS relay.
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    /// # Errors
    /// * `InvalidMessage` - `email.from` is not a valid mailbox
    /// * `Transport` - Relay host could not be resolved into a transport
    pub fn new(email: &EmailConfig, smtp: &SmtpConfig) -> Result<Self, DeliveryError> {
        let from = email
            .from
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::InvalidMessage(format!("sender address: {}", e)))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(smtp.port)
            .credentials(Credentials::new(
                smtp.username.clone(),
                smtp.password.clone(),
            ))
            .timeout(Some(email.timeout()))
            .build();

        tracing::info!(host = %smtp.host, port = smtp.port, "SMTP transport configured");

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        let to = message
            .to
            .as_str()
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| DeliveryError::InvalidMessage(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        tracing::debug!(to = %message.to, "Email handed to relay");
        Ok(())
    }
}
