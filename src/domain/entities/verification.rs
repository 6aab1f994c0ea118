use chrono::{DateTime, Duration, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Channel used to deliver a verification code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum ContactMethod {
    #[display("whatsapp")]
    Whatsapp,

    #[display("googleChat")]
    GoogleChat,
}

/// Pending or confirmed verification, keyed by contact identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub code: String,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
    pub verified: bool,
    pub contact_method: ContactMethod,
    pub name: String,
    pub email: String,
}

impl VerificationRecord {
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.created_at)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) > ttl
    }

    /// A record gates a booking only while verified and still inside its TTL.
    pub fn is_bookable(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.verified && !self.is_expired(now, ttl)
    }
}

/// Limits applied to every verification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub ttl: Duration,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVerificationRequest {
    #[serde(default)]
    pub contact_method: Option<ContactMethod>,

    #[serde(default)]
    pub contact_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueVerificationResponse {
    pub message: String,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmVerificationRequest {
    #[serde(default)]
    pub contact_id: String,

    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Verified,
    AlreadyVerified,
}
