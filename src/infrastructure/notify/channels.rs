use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use zeroize::Zeroizing;

use crate::{
    entities::verification::ContactMethod,
    errors::AppError,
    repositories::notifier::VerificationChannel,
    settings::{GoogleChatSettings, WhatsAppSettings},
};

/// Delivers codes as a WhatsApp Cloud API template message.
pub struct WhatsAppChannel {
    client: Client,
    endpoint: String,
    token: Zeroizing<String>,
    template: String,
    language: String,
}

impl WhatsAppChannel {
    pub fn new(client: Client, settings: &WhatsAppSettings) -> Self {
        WhatsAppChannel {
            client,
            endpoint: format!(
                "{}/{}/messages",
                settings.api_base.trim_end_matches('/'),
                settings.phone_number_id
            ),
            token: Zeroizing::new(settings.token.clone()),
            template: settings.template.clone(),
            language: settings.language.clone(),
        }
    }

    fn payload(&self, phone_number: &str, code: &str) -> serde_json::Value {
        json!({
            "messaging_product": "whatsapp",
            "to": phone_number,
            "type": "template",
            "template": {
                "name": self.template,
                "language": { "code": self.language },
                "components": [{
                    "type": "body",
                    "parameters": [{ "type": "text", "text": code }]
                }]
            }
        })
    }
}

/// Posts the code into a Google Chat space.
pub struct GoogleChatChannel {
    client: Client,
    api_base: String,
    token: Zeroizing<String>,
    valid_for_minutes: i64,
}

impl GoogleChatChannel {
    pub fn new(client: Client, settings: &GoogleChatSettings, valid_for_minutes: i64) -> Self {
        GoogleChatChannel {
            client,
            api_base: settings.api_base.trim_end_matches('/').to_string(),
            token: Zeroizing::new(settings.token.clone()),
            valid_for_minutes,
        }
    }

    fn endpoint(&self, chat_id: &str) -> String {
        format!("{}/spaces/{}/messages", self.api_base, urlencoding::encode(chat_id))
    }

    fn text(&self, code: &str) -> String {
        format!(
            "Your verification code is: {code}. Valid for {} minutes.",
            self.valid_for_minutes
        )
    }
}

async fn post_json(
    client: &Client,
    url: &str,
    token: &str,
    body: &serde_json::Value,
    channel: &str,
) -> Result<(), AppError> {
    let response = client.post(url).bearer_auth(token).json(body).send().await?;

    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let detail = response.text().await.unwrap_or_default();
    Err(AppError::DeliveryError(format!(
        "{channel} API request failed (status={status}): {detail}"
    )))
}

#[async_trait]
impl VerificationChannel for WhatsAppChannel {
    async fn send_code(&self, _method: ContactMethod, contact_id: &str, code: &str) -> Result<(), AppError> {
        let body = self.payload(contact_id, code);
        post_json(&self.client, &self.endpoint, &self.token, &body, "WhatsApp").await
    }
}

#[async_trait]
impl VerificationChannel for GoogleChatChannel {
    async fn send_code(&self, _method: ContactMethod, contact_id: &str, code: &str) -> Result<(), AppError> {
        let body = json!({ "text": self.text(code) });
        post_json(&self.client, &self.endpoint(contact_id), &self.token, &body, "Google Chat").await
    }
}

/// Picks the channel matching the requested contact method.
pub struct ChannelRouter {
    whatsapp: Arc<dyn VerificationChannel>,
    google_chat: Arc<dyn VerificationChannel>,
}

impl ChannelRouter {
    pub fn new(whatsapp: Arc<dyn VerificationChannel>, google_chat: Arc<dyn VerificationChannel>) -> Self {
        ChannelRouter { whatsapp, google_chat }
    }
}

#[async_trait]
impl VerificationChannel for ChannelRouter {
    async fn send_code(&self, method: ContactMethod, contact_id: &str, code: &str) -> Result<(), AppError> {
        let channel = match method {
            ContactMethod::Whatsapp => &self.whatsapp,
            ContactMethod::GoogleChat => &self.google_chat,
        };
        channel.send_code(method, contact_id, code).await
    }
}
