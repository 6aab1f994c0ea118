use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Inclusive bounds of the six-digit verification code.
pub const CODE_MIN: u32 = 100_000;
pub const CODE_MAX: u32 = 999_999;

pub const ISSUE_SUCCESS_MESSAGE: &str = "Verification code sent";
pub const CONFIRM_SUCCESS_MESSAGE: &str = "Contact verified successfully";
pub const BOOKING_SUCCESS_MESSAGE: &str = "Appointment booked successfully";
pub const CONTACT_SUCCESS_MESSAGE: &str = "Form submission successful. Thank you for your message.";
