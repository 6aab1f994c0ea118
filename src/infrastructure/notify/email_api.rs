use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::{
    entities::notification::{EmailBody, OutgoingEmail},
    errors::AppError,
    repositories::notifier::EmailSender,
    settings::EmailSettings,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<EmailAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

/// Transactional email over a Brevo-compatible JSON API.
pub struct ApiMailer {
    client: Client,
    url: String,
    api_key: Zeroizing<String>,
    sender_email: String,
    sender_name: Option<String>,
}

impl ApiMailer {
    pub fn new(client: Client, settings: &EmailSettings) -> Self {
        ApiMailer {
            client,
            url: settings.api_url.clone(),
            api_key: Zeroizing::new(settings.api_key.clone()),
            sender_email: settings.sender.clone(),
            sender_name: settings.sender_name.clone(),
        }
    }

    fn payload(&self, email: &OutgoingEmail) -> SendEmailBody {
        let (html_content, text_content) = match &email.body {
            EmailBody::Html(html) => (Some(html.clone()), None),
            EmailBody::Text(text) => (None, Some(text.clone())),
        };

        SendEmailBody {
            sender: EmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: email
                .to
                .iter()
                .map(|address| EmailAddress {
                    email: address.clone(),
                    name: None,
                })
                .collect(),
            subject: email.subject.clone(),
            reply_to: email.reply_to.as_ref().map(|address| EmailAddress {
                email: address.clone(),
                name: None,
            }),
            html_content,
            text_content,
        }
    }
}

#[async_trait]
impl EmailSender for ApiMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.url)
            .header("api-key", self.api_key.as_str())
            .header("Accept", "application/json")
            .json(&self.payload(email))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::DeliveryError(format!(
            "email API send failed (status={status}): {body}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_uses_camel_case_fields() {
        let settings = EmailSettings {
            sender: "noreply@example.com".into(),
            api_key: "key".into(),
            ..EmailSettings::default()
        };
        let mailer = ApiMailer::new(Client::new(), &settings);
        let email = OutgoingEmail {
            to: vec!["owner@example.com".into()],
            subject: "Hi".into(),
            body: EmailBody::Html("<p>Hi</p>".into()),
            reply_to: Some("ada@example.com".into()),
        };

        let json = serde_json::to_value(mailer.payload(&email)).unwrap();

        assert_eq!(json["sender"]["email"], "noreply@example.com");
        assert_eq!(json["to"][0]["email"], "owner@example.com");
        assert_eq!(json["replyTo"]["email"], "ada@example.com");
        assert_eq!(json["htmlContent"], "<p>Hi</p>");
        assert!(json.get("textContent").is_none());
    }
}
