#![allow(dead_code)]

use actix_web::{
    http::header,
    middleware::{DefaultHeaders, NormalizePath},
    web, App, HttpServer,
};
use async_trait::async_trait;
use chrono::Utc;
use contact_backend::{
    entities::{
        notification::OutgoingEmail,
        verification::{ContactMethod, VerificationRecord},
    },
    errors::AppError,
    middlewares::cors::build_cors,
    repositories::notifier::{EmailSender, VerificationChannel},
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment, EmailSettings},
    store::memory::MemoryStore,
    utils::{clock::ManualClock, user_agent::WootheeParser},
    AppState, Collaborators,
};
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::{json, Value};
use std::{
    net::TcpListener,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

pub const PHONE: &str = "+15551234567";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCode {
    pub method: ContactMethod,
    pub contact_id: String,
    pub code: String,
}

/// Verification channel that remembers every code instead of sending it.
#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<SentCode>>,
    pub fail: AtomicBool,
}

impl RecordingChannel {
    pub fn last_code(&self, contact_id: &str) -> Option<String> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|sent| sent.contact_id == contact_id)
            .map(|sent| sent.code.clone())
    }

    pub fn failing() -> Self {
        RecordingChannel {
            fail: AtomicBool::new(true),
            ..RecordingChannel::default()
        }
    }
}

#[async_trait]
impl VerificationChannel for RecordingChannel {
    async fn send_code(&self, method: ContactMethod, contact_id: &str, code: &str) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::DeliveryError("channel offline".into()));
        }
        self.sent.lock().push(SentCode {
            method,
            contact_id: contact_id.to_string(),
            code: code.to_string(),
        });
        Ok(())
    }
}

/// Mailer that records outgoing mail; `fail` makes every send error.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub fail: AtomicBool,
}

impl RecordingMailer {
    pub fn subjects(&self) -> Vec<String> {
        self.sent.lock().iter().map(|email| email.subject.clone()).collect()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::DeliveryError("smtp unavailable".into()));
        }
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub address: String,
    pub client: Client,
    pub config: AppConfig,
    pub channel: Arc<RecordingChannel>,
    pub mailer: Arc<RecordingMailer>,
    pub clock: ManualClock,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Self {
        let channel = Arc::new(RecordingChannel::default());
        let mailer = Arc::new(RecordingMailer::default());
        let clock = ManualClock::new(Utc::now());

        let collaborators = Collaborators {
            channel: channel.clone(),
            mailer: mailer.clone(),
            push: None,
            user_agents: Arc::new(WootheeParser::new()),
            clock: Arc::new(clock.clone()),
        };
        let state = web::Data::new(AppState::new(&config, collaborators));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let state_clone = state.clone();
        let server_config = config.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(state_clone.clone())
                .wrap(NormalizePath::trim())
                .wrap(build_cors(&server_config))
                .wrap(
                    DefaultHeaders::new()
                        .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                        .add((header::X_FRAME_OPTIONS, "DENY")),
                )
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::new();
        while client.get(&format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        TestApp {
            state,
            address,
            client,
            config,
            channel,
            mailer,
            clock,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(&self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send request")
    }

    pub async fn issue(&self, contact_id: &str) -> reqwest::Response {
        self.post_json(
            "/api/appointment/verify",
            &json!({
                "contactMethod": "whatsapp",
                "contactId": contact_id,
                "name": "Ada Lovelace",
                "email": "ada@example.com"
            }),
        )
        .await
    }

    pub async fn confirm(&self, contact_id: &str, code: &str) -> reqwest::Response {
        self.post_json(
            "/api/appointment/verify/confirm",
            &json!({ "contactId": contact_id, "code": code }),
        )
        .await
    }

    pub async fn book(&self, contact_id: &str) -> reqwest::Response {
        self.post_json(
            "/api/appointment/book",
            &json!({ "contactId": contact_id, "date": "2030-05-17", "time": "14:30" }),
        )
        .await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Contact Backend Test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        worker_count: 1,
        email: EmailSettings {
            operator_address: "owner@example.com".into(),
            ..EmailSettings::default()
        },
        ..AppConfig::default()
    }
}

pub fn record(created_at: chrono::DateTime<Utc>, verified: bool) -> VerificationRecord {
    VerificationRecord {
        code: "123456".into(),
        attempts: 0,
        created_at,
        verified,
        contact_method: ContactMethod::Whatsapp,
        name: "Ada Lovelace".into(),
        email: "ada@example.com".into(),
    }
}

pub fn verification_store() -> MemoryStore<VerificationRecord> {
    MemoryStore::new()
}

/// A code guaranteed to differ from `code`.
pub fn wrong_code(code: &str) -> String {
    if code == "100000" { "100001".into() } else { "100000".into() }
}
