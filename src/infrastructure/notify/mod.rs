use std::sync::Arc;

use reqwest::Client;

use crate::{
    repositories::notifier::{EmailSender, PushNotifier, VerificationChannel},
    settings::{AppConfig, EmailTransport},
};

pub mod channels;
pub mod email_api;
pub mod log_mailer;
pub mod pushover;
pub mod smtp;

use channels::{ChannelRouter, GoogleChatChannel, WhatsAppChannel};
use email_api::ApiMailer;
use log_mailer::LogMailer;
use pushover::PushoverNotifier;
use smtp::SmtpMailer;

/// Shared HTTP client for every outbound API; the timeout bounds each call.
pub fn build_http_client(config: &AppConfig) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(config.dispatch_timeout())
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub fn build_mailer(config: &AppConfig, client: &Client) -> anyhow::Result<Arc<dyn EmailSender>> {
    let mailer: Arc<dyn EmailSender> = match config.email.transport {
        EmailTransport::Smtp => Arc::new(SmtpMailer::new(&config.email, config.dispatch_timeout())?),
        EmailTransport::Api => Arc::new(ApiMailer::new(client.clone(), &config.email)),
        EmailTransport::Log => {
            tracing::warn!("Email transport is 'log'; messages will not be delivered");
            Arc::new(LogMailer)
        }
    };
    Ok(mailer)
}

pub fn build_push(config: &AppConfig, client: &Client) -> Option<Arc<dyn PushNotifier>> {
    config
        .push
        .as_ref()
        .map(|settings| Arc::new(PushoverNotifier::new(client.clone(), settings)) as Arc<dyn PushNotifier>)
}

pub fn build_channels(config: &AppConfig, client: &Client) -> Arc<dyn VerificationChannel> {
    let whatsapp = Arc::new(WhatsAppChannel::new(client.clone(), &config.whatsapp));
    let google_chat = Arc::new(GoogleChatChannel::new(
        client.clone(),
        &config.google_chat,
        config.verification.code_ttl_secs / 60,
    ));
    Arc::new(ChannelRouter::new(whatsapp, google_chat))
}
