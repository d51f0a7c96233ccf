use async_trait::async_trait;
use tracing::info;

use super::{EmailMessage, MailError, Mailer};

/// Development transport: records the message instead of delivering it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text_body,
            "Mail not delivered, log driver active"
        );
        Ok(())
    }
}
