use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use zeroize::Zeroizing;

use crate::{
    entities::notification::PushMessage, errors::AppError, repositories::notifier::PushNotifier,
    settings::PushSettings,
};

#[derive(Serialize)]
struct PushoverBody<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
}

pub struct PushoverNotifier {
    client: Client,
    api_url: String,
    token: Zeroizing<String>,
    user: Zeroizing<String>,
}

impl PushoverNotifier {
    pub fn new(client: Client, settings: &PushSettings) -> Self {
        PushoverNotifier {
            client,
            api_url: settings.api_url.clone(),
            token: Zeroizing::new(settings.token.clone()),
            user: Zeroizing::new(settings.user.clone()),
        }
    }

    fn payload<'a>(&'a self, message: &'a PushMessage) -> PushoverBody<'a> {
        PushoverBody {
            token: &self.token,
            user: &self.user,
            title: &message.title,
            message: &message.body,
        }
    }
}

#[async_trait]
impl PushNotifier for PushoverNotifier {
    async fn notify(&self, message: &PushMessage) -> Result<(), AppError> {
        let response = self
            .client
            .post(&self.api_url)
            .json(&self.payload(message)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::DeliveryError(format!(
                "push notification rejected (status={status})"
            )));
        }

        Ok(())
    }
}
