use async_trait::async_trait;

use crate::{
    entities::{
        client::UserAgentInfo,
        notification::{OutgoingEmail, PushMessage},
        verification::ContactMethod,
    },
    errors::AppError,
};

#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Delivers one email; failures surface as `AppError::DeliveryError`.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError>;
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn notify(&self, message: &PushMessage) -> Result<(), AppError>;
}

#[async_trait]
pub trait VerificationChannel: Send + Sync {
    /// Sends `code` to `contact_id` over the channel matching `method`.
    async fn send_code(&self, method: ContactMethod, contact_id: &str, code: &str) -> Result<(), AppError>;
}

pub trait UserAgentParser: Send + Sync {
    fn parse(&self, user_agent: &str) -> UserAgentInfo;
}
