use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde_json::{json, Map, Value};

use crate::validation::Rule;

#[derive(Debug, Display)]
pub enum AppError {
    #[display("Validation failed: {_0}")]
    ValidationError(Rule),

    #[display("No active verification found")]
    NotFound,

    #[display("Verification code expired")]
    Expired,

    #[display("Invalid verification code")]
    InvalidCode { attempts_remaining: u32 },

    #[display("Too many attempts, please try again later")]
    RateExceeded {
        retry_after_secs: Option<u64>,
        blocked_until: Option<DateTime<Utc>>,
    },

    #[display("Contact not verified")]
    NotVerified,

    #[display("Delivery failed: {_0}")]
    DeliveryError(String),

    #[display("Internal server error: {_0}")]
    InternalError(String),
}

impl AppError {
    /// Attempt ceiling reached; nothing to wait for but a fresh verification.
    pub fn rate_exceeded() -> Self {
        AppError::RateExceeded {
            retry_after_secs: None,
            blocked_until: None,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation_error",
            AppError::NotFound => "not_found",
            AppError::Expired => "expired",
            AppError::InvalidCode { .. } => "invalid_code",
            AppError::RateExceeded { .. } => "rate_exceeded",
            AppError::NotVerified => "not_verified",
            AppError::DeliveryError(_) => "delivery_error",
            AppError::InternalError(_) => "internal_server_error",
        }
    }

    /// Message shown to the caller. Downstream and internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::DeliveryError(_) => "Failed to deliver notification".to_string(),
            AppError::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let mut body = Map::new();
        body.insert("error".into(), json!(self.error_code()));
        body.insert("message".into(), json!(self.public_message()));

        let mut builder = HttpResponse::build(self.status_code());

        match self {
            AppError::ValidationError(rule) => {
                body.insert("rule".into(), json!(rule));
            }
            AppError::InvalidCode { attempts_remaining } => {
                body.insert("attemptsRemaining".into(), json!(attempts_remaining));
            }
            AppError::RateExceeded { retry_after_secs, blocked_until } => {
                if let Some(secs) = retry_after_secs {
                    builder.insert_header((header::RETRY_AFTER, secs.to_string()));
                    body.insert("retryAfterSeconds".into(), json!(secs));
                }
                if let Some(until) = blocked_until {
                    body.insert("blockedUntil".into(), json!(until.to_rfc3339()));
                }
            }
            _ => {}
        }

        builder.json(Value::Object(body))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::BAD_REQUEST,
            AppError::Expired => StatusCode::BAD_REQUEST,
            AppError::InvalidCode { .. } => StatusCode::BAD_REQUEST,
            AppError::RateExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotVerified => StatusCode::BAD_REQUEST,
            AppError::DeliveryError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::DeliveryError(format!("request timed out: {}", err))
        } else {
            AppError::DeliveryError(err.to_string())
        }
    }
}

impl From<lettre::transport::smtp::Error> for AppError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        AppError::DeliveryError(format!("SMTP error: {}", err))
    }
}

impl From<lettre::error::Error> for AppError {
    fn from(err: lettre::error::Error) -> Self {
        AppError::InternalError(format!("Failed to build email: {}", err))
    }
}

impl From<lettre::address::AddressError> for AppError {
    fn from(err: lettre::address::AddressError) -> Self {
        AppError::InternalError(format!("Invalid email address: {}", err))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}
