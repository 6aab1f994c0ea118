use async_trait::async_trait;

use crate::{
    entities::notification::OutgoingEmail, errors::AppError, repositories::notifier::EmailSender,
};

/// Writes outgoing mail to the log instead of sending it. Development only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        tracing::info!(
            event = "EMAIL_LOGGED",
            to = ?email.to,
            subject = %email.subject,
            reply_to = ?email.reply_to,
            "Email not sent, log transport active"
        );
        Ok(())
    }
}
