use async_trait::async_trait;

use crate::domain::user::models::EmailMessage;
use crate::user::errors::DeliveryError;
use crate::user::ports::EmailSender;

/// Sender used when no SMTP relay is configured.
///
/// Recipient and subject are logged at `info`. The body carries the raw reset
/// link, so it only appears at `debug`.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<(), DeliveryError> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email not sent: no SMTP relay configured"
        );
        tracing::debug!(to = %message.to, body = %message.body, "Email body");

        Ok(())
    }
}
