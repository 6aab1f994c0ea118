use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr};
use url::Url;

use crate::entities::{
    rate_limit::{ClientKeyMode, RateLimitPolicy},
    verification::VerificationPolicy,
};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransport {
    Smtp,
    Api,
    #[default]
    Log,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct VerificationSettings {
    pub code_ttl_secs: i64,
    pub max_attempts: u32,
}

impl Default for VerificationSettings {
    fn default() -> Self {
        VerificationSettings {
            code_ttl_secs: 10 * 60,
            max_attempts: 3,
        }
    }
}

impl VerificationSettings {
    pub fn policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            ttl: chrono::Duration::seconds(self.code_ttl_secs),
            max_attempts: self.max_attempts,
        }
    }
}

/// Upper bound for every configured duration (365 days).
const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RateLimitSettings {
    pub window_secs: i64,
    pub max_requests: u32,
    /// 0 disables blocking; the window alone then limits the client.
    pub block_secs: i64,
    pub key_mode: ClientKeyMode,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        RateLimitSettings {
            window_secs: 15 * 60,
            max_requests: 5,
            block_secs: 24 * 60 * 60,
            key_mode: ClientKeyMode::Ip,
        }
    }
}

impl RateLimitSettings {
    pub fn policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            window: chrono::Duration::seconds(self.window_secs),
            max_requests: self.max_requests,
            block_for: (self.block_secs > 0).then(|| chrono::Duration::seconds(self.block_secs)),
            key_mode: self.key_mode,
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct EmailSettings {
    pub transport: EmailTransport,
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub sender: String,
    pub sender_name: Option<String>,
    pub operator_address: String,
    pub api_url: String,
    pub api_key: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        EmailSettings {
            transport: EmailTransport::Log,
            smtp_host: String::new(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            sender: "noreply@localhost.localdomain".to_string(),
            sender_name: None,
            operator_address: String::new(),
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: String::new(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct WhatsAppSettings {
    pub api_base: String,
    pub phone_number_id: String,
    pub token: String,
    pub template: String,
    pub language: String,
}

impl Default for WhatsAppSettings {
    fn default() -> Self {
        WhatsAppSettings {
            api_base: "https://graph.facebook.com/v17.0".to_string(),
            phone_number_id: String::new(),
            token: String::new(),
            template: "verification_code".to_string(),
            language: "en".to_string(),
        }
    }
}

#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct GoogleChatSettings {
    pub api_base: String,
    pub token: String,
}

impl Default for GoogleChatSettings {
    fn default() -> Self {
        GoogleChatSettings {
            api_base: "https://chat.googleapis.com/v1".to_string(),
            token: String::new(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct PushSettings {
    #[serde(default = "default_push_url")]
    pub api_url: String,
    pub token: String,
    pub user: String,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_dispatch_timeout")]
    pub dispatch_timeout_secs: u64,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default)]
    pub verification: VerificationSettings,

    #[serde(default)]
    pub rate_limit: RateLimitSettings,

    #[serde(default)]
    pub email: EmailSettings,

    #[serde(default)]
    pub whatsapp: WhatsAppSettings,

    #[serde(default)]
    pub google_chat: GoogleChatSettings,

    #[serde(default)]
    pub push: Option<PushSettings>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Contact-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_dispatch_timeout() -> u64 {
    10
}
fn default_sweep_interval() -> u64 {
    60
}
fn default_push_url() -> String {
    "https://api.pushover.net/1/messages.json".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: false,
            log_format: LogFormat::default(),
            dispatch_timeout_secs: default_dispatch_timeout(),
            sweep_interval_secs: default_sweep_interval(),
            verification: VerificationSettings::default(),
            rate_limit: RateLimitSettings::default(),
            email: EmailSettings::default(),
            whatsapp: WhatsAppSettings::default(),
            google_chat: GoogleChatSettings::default(),
            push: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        // Nested keys use a double underscore: APP_RATE_LIMIT__MAX_REQUESTS=10
        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();
        let too_long = |secs: i64| secs > MAX_DURATION_SECS;

        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production".into());
        }
        if self.verification.code_ttl_secs <= 0 || too_long(self.verification.code_ttl_secs) {
            errors.push("VERIFICATION__CODE_TTL_SECS must be between 1 and 31536000".into());
        }
        if self.verification.max_attempts == 0 {
            errors.push("VERIFICATION__MAX_ATTEMPTS must be at least 1".into());
        }
        if self.rate_limit.window_secs <= 0 || too_long(self.rate_limit.window_secs) {
            errors.push("RATE_LIMIT__WINDOW_SECS must be between 1 and 31536000".into());
        }
        if self.rate_limit.max_requests == 0 {
            errors.push("RATE_LIMIT__MAX_REQUESTS must be at least 1".into());
        }
        if self.rate_limit.block_secs < 0 || too_long(self.rate_limit.block_secs) {
            errors.push("RATE_LIMIT__BLOCK_SECS must be between 0 and 31536000".into());
        }
        if self.sweep_interval_secs == 0 {
            errors.push("SWEEP_INTERVAL_SECS must be at least 1".into());
        }
        if self.dispatch_timeout_secs == 0 {
            errors.push("DISPATCH_TIMEOUT_SECS must be at least 1".into());
        }
        if self.email.operator_address.trim().is_empty() {
            errors.push("EMAIL__OPERATOR_ADDRESS must be set".into());
        }

        match self.email.transport {
            EmailTransport::Smtp => {
                if self.email.smtp_host.trim().is_empty() {
                    errors.push("EMAIL__SMTP_HOST must be set for the smtp transport".into());
                }
                if self.email.smtp_username.is_empty() || self.email.smtp_password.is_empty() {
                    errors.push("EMAIL__SMTP_USERNAME and EMAIL__SMTP_PASSWORD must be set for the smtp transport".into());
                }
            }
            EmailTransport::Api => {
                if self.email.api_key.is_empty() {
                    errors.push("EMAIL__API_KEY must be set for the api transport".into());
                }
                check_url(&mut errors, "EMAIL__API_URL", &self.email.api_url);
            }
            EmailTransport::Log => {
                if self.is_production() {
                    errors.push("The log email transport is not allowed in production".into());
                }
            }
        }

        check_url(&mut errors, "WHATSAPP__API_BASE", &self.whatsapp.api_base);
        check_url(&mut errors, "GOOGLE_CHAT__API_BASE", &self.google_chat.api_base);

        if let Some(push) = &self.push {
            check_url(&mut errors, "PUSH__API_URL", &push.api_url);
            if push.token.is_empty() || push.user.is_empty() {
                errors.push("PUSH__TOKEN and PUSH__USER must both be set".into());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn dispatch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.dispatch_timeout_secs)
    }
}

fn check_url(errors: &mut Vec<String>, key: &str, value: &str) {
    if let Err(e) = Url::parse(value) {
        errors.push(format!("{key} is not a valid URL: {e}"));
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailSettings")
            .field("transport", &self.transport)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.redact())
            .field("sender", &self.sender)
            .field("sender_name", &self.sender_name)
            .field("operator_address", &self.operator_address)
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.redact())
            .finish()
    }
}

impl fmt::Debug for WhatsAppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhatsAppSettings")
            .field("api_base", &self.api_base)
            .field("phone_number_id", &self.phone_number_id)
            .field("token", &self.token.redact())
            .field("template", &self.template)
            .field("language", &self.language)
            .finish()
    }
}

impl fmt::Debug for GoogleChatSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleChatSettings")
            .field("api_base", &self.api_base)
            .field("token", &self.token.redact())
            .finish()
    }
}

impl fmt::Debug for PushSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushSettings")
            .field("api_url", &self.api_url)
            .field("token", &self.token.redact())
            .field("user", &self.user.redact())
            .finish()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("log_format", &self.log_format)
            .field("dispatch_timeout_secs", &self.dispatch_timeout_secs)
            .field("sweep_interval_secs", &self.sweep_interval_secs)
            .field("verification", &self.verification)
            .field("rate_limit", &self.rate_limit)
            .field("email", &self.email)
            .field("whatsapp", &self.whatsapp)
            .field("google_chat", &self.google_chat)
            .field("push", &self.push)
            .finish()
    }
}
