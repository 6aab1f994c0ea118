//! Declarative input validation.
//!
//! Each request type owns an ordered list of named rules. Evaluation stops at
//! the first rule that fails and reports that rule, so clients always learn
//! which check rejected them.

use chrono::{NaiveDate, NaiveTime};
use derive_more::Display;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use validator::ValidateEmail;

use crate::{
    entities::{
        booking::BookingRequest,
        contact::ContactForm,
        verification::{ConfirmVerificationRequest, ContactMethod, IssueVerificationRequest},
    },
    errors::AppError,
};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_MESSAGE_LEN: usize = 500;

static EMAIL_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static WHATSAPP_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

static SUSPICIOUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)<script>",
        r"(?i)javascript:",
        r"(?i)onclick=",
        r"(?i)alert\(",
        r"(?i)\b(test|hack|spam)\b",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid suspicious-content regex"))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    #[display("contact method is required")]
    ContactMethodRequired,

    #[display("contact id is required")]
    ContactIdRequired,

    #[display("name is required")]
    NameRequired,

    #[display("email is required")]
    EmailRequired,

    #[display("message is required")]
    MessageRequired,

    #[display("verification code is required")]
    CodeRequired,

    #[display("date is required")]
    DateRequired,

    #[display("time is required")]
    TimeRequired,

    #[display("email format is invalid")]
    EmailFormat,

    #[display("WhatsApp number is invalid")]
    WhatsappNumberFormat,

    #[display("Google Chat id is invalid")]
    GoogleChatIdFormat,

    #[display("date must be formatted as YYYY-MM-DD")]
    DateFormat,

    #[display("time must be formatted as HH:MM")]
    TimeFormat,

    #[display("content was rejected")]
    SuspiciousContent,

    #[display("name must be at most 50 characters")]
    NameTooLong,

    #[display("email must be at most 100 characters")]
    EmailTooLong,

    #[display("message must be at most 500 characters")]
    MessageTooLong,
}

/// A named predicate over `T`; `check` returns true when the input passes.
pub struct ValidationRule<T> {
    pub rule: Rule,
    pub check: fn(&T) -> bool,
}

/// Evaluates `rules` in order, failing on the first rule that does not hold.
pub fn evaluate<T>(input: &T, rules: &[ValidationRule<T>]) -> Result<(), Rule> {
    match rules.iter().find(|candidate| !(candidate.check)(input)) {
        Some(failed) => Err(failed.rule),
        None => Ok(()),
    }
}

/// Implemented by request types that carry their own rule list.
pub trait RuleSet: Sized + 'static {
    fn rules() -> &'static [ValidationRule<Self>];

    fn validate_rules(&self) -> Result<(), AppError> {
        evaluate(self, Self::rules()).map_err(AppError::ValidationError)
    }
}

pub fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    let value = value.trim();
    EMAIL_SHAPE.is_match(value) && value.validate_email()
}

pub fn is_whatsapp_number(value: &str) -> bool {
    WHATSAPP_NUMBER.is_match(value.trim())
}

/// Intentionally loose: chat-space ids only need an '@' and some length.
pub fn is_google_chat_id(value: &str) -> bool {
    let value = value.trim();
    value.contains('@') && value.chars().count() > 5
}

pub fn contains_suspicious_content(value: &str) -> bool {
    SUSPICIOUS_PATTERNS.iter().any(|pattern| pattern.is_match(value))
}

pub fn is_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").is_ok()
}

pub fn is_time(value: &str) -> bool {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").is_ok()
}

fn within(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

static ISSUE_VERIFICATION_RULES: &[ValidationRule<IssueVerificationRequest>] = &[
    ValidationRule {
        rule: Rule::ContactMethodRequired,
        check: |r: &IssueVerificationRequest| r.contact_method.is_some(),
    },
    ValidationRule {
        rule: Rule::ContactIdRequired,
        check: |r: &IssueVerificationRequest| is_present(&r.contact_id),
    },
    ValidationRule {
        rule: Rule::NameRequired,
        check: |r: &IssueVerificationRequest| is_present(&r.name),
    },
    ValidationRule {
        rule: Rule::EmailRequired,
        check: |r: &IssueVerificationRequest| is_present(&r.email),
    },
    ValidationRule {
        rule: Rule::EmailFormat,
        check: |r: &IssueVerificationRequest| is_valid_email(&r.email),
    },
    ValidationRule {
        rule: Rule::NameTooLong,
        check: |r: &IssueVerificationRequest| within(&r.name, MAX_NAME_LEN),
    },
    ValidationRule {
        rule: Rule::EmailTooLong,
        check: |r: &IssueVerificationRequest| within(&r.email, MAX_EMAIL_LEN),
    },
    ValidationRule {
        rule: Rule::WhatsappNumberFormat,
        check: |r: &IssueVerificationRequest| {
            r.contact_method != Some(ContactMethod::Whatsapp) || is_whatsapp_number(&r.contact_id)
        },
    },
    ValidationRule {
        rule: Rule::GoogleChatIdFormat,
        check: |r: &IssueVerificationRequest| {
            r.contact_method != Some(ContactMethod::GoogleChat) || is_google_chat_id(&r.contact_id)
        },
    },
];

static CONFIRM_VERIFICATION_RULES: &[ValidationRule<ConfirmVerificationRequest>] = &[
    ValidationRule {
        rule: Rule::ContactIdRequired,
        check: |r: &ConfirmVerificationRequest| is_present(&r.contact_id),
    },
    ValidationRule {
        rule: Rule::CodeRequired,
        check: |r: &ConfirmVerificationRequest| is_present(&r.code),
    },
];

static BOOKING_RULES: &[ValidationRule<BookingRequest>] = &[
    ValidationRule {
        rule: Rule::ContactIdRequired,
        check: |r: &BookingRequest| is_present(&r.contact_id),
    },
    ValidationRule {
        rule: Rule::DateRequired,
        check: |r: &BookingRequest| is_present(&r.date),
    },
    ValidationRule {
        rule: Rule::DateFormat,
        check: |r: &BookingRequest| is_date(&r.date),
    },
    ValidationRule {
        rule: Rule::TimeRequired,
        check: |r: &BookingRequest| is_present(&r.time),
    },
    ValidationRule {
        rule: Rule::TimeFormat,
        check: |r: &BookingRequest| is_time(&r.time),
    },
];

static CONTACT_FORM_RULES: &[ValidationRule<ContactForm>] = &[
    ValidationRule {
        rule: Rule::NameRequired,
        check: |f: &ContactForm| is_present(&f.name),
    },
    ValidationRule {
        rule: Rule::EmailRequired,
        check: |f: &ContactForm| is_present(&f.email),
    },
    ValidationRule {
        rule: Rule::MessageRequired,
        check: |f: &ContactForm| is_present(&f.message),
    },
    ValidationRule {
        rule: Rule::EmailFormat,
        check: |f: &ContactForm| is_valid_email(&f.email),
    },
    ValidationRule {
        rule: Rule::SuspiciousContent,
        check: |f: &ContactForm| {
            ![&f.name, &f.email, &f.message]
                .iter()
                .any(|field| contains_suspicious_content(field))
        },
    },
    ValidationRule {
        rule: Rule::NameTooLong,
        check: |f: &ContactForm| within(&f.name, MAX_NAME_LEN),
    },
    ValidationRule {
        rule: Rule::EmailTooLong,
        check: |f: &ContactForm| within(&f.email, MAX_EMAIL_LEN),
    },
    ValidationRule {
        rule: Rule::MessageTooLong,
        check: |f: &ContactForm| within(&f.message, MAX_MESSAGE_LEN),
    },
];

impl RuleSet for IssueVerificationRequest {
    fn rules() -> &'static [ValidationRule<Self>] {
        ISSUE_VERIFICATION_RULES
    }
}

impl RuleSet for ConfirmVerificationRequest {
    fn rules() -> &'static [ValidationRule<Self>] {
        CONFIRM_VERIFICATION_RULES
    }
}

impl RuleSet for BookingRequest {
    fn rules() -> &'static [ValidationRule<Self>] {
        BOOKING_RULES
    }
}

impl RuleSet for ContactForm {
    fn rules() -> &'static [ValidationRule<Self>] {
        CONTACT_FORM_RULES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(method: ContactMethod, contact_id: &str) -> IssueVerificationRequest {
        IssueVerificationRequest {
            contact_method: Some(method),
            contact_id: contact_id.into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
        }
    }

    fn contact(name: &str, email: &str, message: &str) -> ContactForm {
        ContactForm {
            name: name.into(),
            email: email.into(),
            message: message.into(),
        }
    }

    #[test]
    fn first_failing_rule_wins() {
        let request = IssueVerificationRequest {
            contact_method: None,
            contact_id: String::new(),
            name: String::new(),
            email: "nope".into(),
        };

        assert_eq!(evaluate(&request, IssueVerificationRequest::rules()), Err(Rule::ContactMethodRequired));
    }

    #[test]
    fn whatsapp_numbers_follow_e164_shape() {
        assert!(issue(ContactMethod::Whatsapp, "+15551234567").validate_rules().is_ok());
        assert!(issue(ContactMethod::Whatsapp, "15551234567").validate_rules().is_ok());

        for bad in ["+05551234567", "+1", "555-1234", "+1234567890123456"] {
            assert!(
                matches!(
                    issue(ContactMethod::Whatsapp, bad).validate_rules(),
                    Err(AppError::ValidationError(Rule::WhatsappNumberFormat))
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn google_chat_ids_are_loosely_checked() {
        assert!(issue(ContactMethod::GoogleChat, "space@chat").validate_rules().is_ok());
        assert!(matches!(
            issue(ContactMethod::GoogleChat, "a@b").validate_rules(),
            Err(AppError::ValidationError(Rule::GoogleChatIdFormat))
        ));
        assert!(matches!(
            issue(ContactMethod::GoogleChat, "spaces/AAAA").validate_rules(),
            Err(AppError::ValidationError(Rule::GoogleChatIdFormat))
        ));
    }

    #[test]
    fn email_requires_a_dotted_domain() {
        assert!(is_valid_email("a@b.com"));
        assert!(!is_valid_email("a@localhost"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
    }

    #[test]
    fn contact_form_rules_run_in_declared_order() {
        assert_eq!(
            evaluate(&contact("", "", ""), ContactForm::rules()),
            Err(Rule::NameRequired)
        );
        assert_eq!(
            evaluate(&contact("Ada", "ada@example.com", "   "), ContactForm::rules()),
            Err(Rule::MessageRequired)
        );
        assert_eq!(
            evaluate(&contact("Ada", "ada@example", "Hello"), ContactForm::rules()),
            Err(Rule::EmailFormat)
        );
        assert_eq!(
            evaluate(&contact(&"A".repeat(51), "ada@example.com", "Hello"), ContactForm::rules()),
            Err(Rule::NameTooLong)
        );
        assert_eq!(
            evaluate(&contact("Ada", "ada@example.com", &"x".repeat(501)), ContactForm::rules()),
            Err(Rule::MessageTooLong)
        );
        assert!(evaluate(&contact("Ada", "ada@example.com", "Hello there"), ContactForm::rules()).is_ok());
    }

    #[test]
    fn suspicious_content_is_rejected_in_any_field() {
        for (name, message) in [
            ("Ada", "<SCRIPT>steal()"),
            ("Ada", "click javascript:void(0)"),
            ("Ada", "just a TEST message"),
            ("hack", "Hello"),
            ("Ada", "alert(1)"),
        ] {
            assert_eq!(
                evaluate(&contact(name, "ada@example.com", message), ContactForm::rules()),
                Err(Rule::SuspiciousContent),
                "{} / {}",
                name,
                message
            );
        }

        // whole words only
        assert!(evaluate(&contact("Ada", "ada@example.com", "Testing the contest form"), ContactForm::rules()).is_ok());
    }

    #[test]
    fn booking_requires_well_formed_date_and_time() {
        let mut request = BookingRequest {
            contact_id: "+15551234567".into(),
            date: "2026-11-02".into(),
            time: "14:30".into(),
        };
        assert!(request.validate_rules().is_ok());

        request.date = "02/11/2026".into();
        assert!(matches!(request.validate_rules(), Err(AppError::ValidationError(Rule::DateFormat))));

        request.date = "2026-11-02".into();
        request.time = "2pm".into();
        assert!(matches!(request.validate_rules(), Err(AppError::ValidationError(Rule::TimeFormat))));
    }

    #[test]
    fn confirm_requires_id_and_code() {
        let request = ConfirmVerificationRequest {
            contact_id: "+15551234567".into(),
            code: " ".into(),
        };
        assert!(matches!(request.validate_rules(), Err(AppError::ValidationError(Rule::CodeRequired))));
    }
}
