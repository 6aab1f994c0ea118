use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

use crate::{
    entities::notification::{EmailBody, OutgoingEmail},
    errors::AppError,
    repositories::notifier::EmailSender,
    settings::EmailSettings,
};

/// Sends mail through an authenticated SMTP relay.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &EmailSettings, timeout: Duration) -> anyhow::Result<Self> {
        let credentials = Credentials::new(
            settings.smtp_username.clone(),
            settings.smtp_password.clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.smtp_host)?
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        let sender = Mailbox::new(settings.sender_name.clone(), settings.sender.parse()?);

        Ok(SmtpMailer { transport, sender })
    }

    fn build_message(&self, email: &OutgoingEmail) -> Result<Message, AppError> {
        let mut builder = Message::builder()
            .from(self.sender.clone())
            .subject(email.subject.clone());

        for recipient in &email.to {
            builder = builder.to(recipient.parse()?);
        }
        if let Some(reply_to) = &email.reply_to {
            builder = builder.reply_to(reply_to.parse()?);
        }

        let message = match &email.body {
            EmailBody::Html(html) => builder.header(ContentType::TEXT_HTML).body(html.clone())?,
            EmailBody::Text(text) => builder.header(ContentType::TEXT_PLAIN).body(text.clone())?,
        };

        Ok(message)
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let message = self.build_message(email)?;
        self.transport.send(message).await?;
        Ok(())
    }
}
