mod test_utils;

use std::sync::Arc;

use chrono::{Duration, Utc};
use contact_backend::{
    entities::verification::{
        ConfirmOutcome, ConfirmVerificationRequest, ContactMethod, IssueVerificationRequest,
        VerificationPolicy, VerificationRecord,
    },
    errors::AppError,
    repositories::store::KeyValueStore,
    store::memory::MemoryStore,
    use_cases::verification::VerificationHandler,
    utils::clock::{Clock, ManualClock},
    validation::Rule,
};
use futures_util::future::join_all;
use test_utils::*;

type Handler = VerificationHandler<MemoryStore<VerificationRecord>>;

fn handler_with(channel: Arc<RecordingChannel>) -> (Handler, ManualClock) {
    let clock = ManualClock::new(Utc::now());
    let policy = VerificationPolicy {
        ttl: Duration::minutes(10),
        max_attempts: 3,
    };
    let handler = VerificationHandler::new(
        verification_store(),
        channel,
        Arc::new(clock.clone()),
        policy,
    );
    (handler, clock)
}

fn issue_request(method: ContactMethod, contact_id: &str) -> IssueVerificationRequest {
    IssueVerificationRequest {
        contact_method: Some(method),
        contact_id: contact_id.to_string(),
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    }
}

fn confirm_request(contact_id: &str, code: &str) -> ConfirmVerificationRequest {
    ConfirmVerificationRequest {
        contact_id: contact_id.to_string(),
        code: code.to_string(),
    }
}

#[actix_rt::test]
async fn issue_stores_one_record_and_sends_the_code() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, _clock) = handler_with(channel.clone());

    let response = handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();

    assert_eq!(response.expires_in_seconds, 600);
    assert_eq!(handler.store.count().await.unwrap(), 1);

    let record = handler.store.get(PHONE).await.unwrap().unwrap();
    let sent = channel.sent.lock().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, ContactMethod::Whatsapp);
    assert_eq!(sent[0].code, record.code);
    assert_eq!(record.attempts, 0);
    assert!(!record.verified);
}

#[actix_rt::test]
async fn reissue_replaces_the_code_and_counts_an_attempt() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, _clock) = handler_with(channel.clone());

    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let first = handler.store.get(PHONE).await.unwrap().unwrap();
    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let second = handler.store.get(PHONE).await.unwrap().unwrap();

    assert_eq!(handler.store.count().await.unwrap(), 1);
    assert_ne!(first.code, second.code);
    assert_eq!(second.attempts, 1);
}

#[actix_rt::test]
async fn issue_is_refused_once_attempts_are_exhausted() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, clock) = handler_with(channel.clone());
    let exhausted = VerificationRecord {
        attempts: 3,
        ..record(clock.now(), false)
    };
    handler.store.set(PHONE, exhausted).await.unwrap();

    let result = handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await;

    assert!(matches!(result, Err(AppError::RateExceeded { .. })));
    assert!(channel.sent.lock().is_empty());
}

#[actix_rt::test]
async fn expired_record_is_replaced_as_if_absent() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, clock) = handler_with(channel);
    let stale = VerificationRecord {
        attempts: 3,
        ..record(clock.now() - Duration::minutes(30), false)
    };
    handler.store.set(PHONE, stale).await.unwrap();

    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();

    let record = handler.store.get(PHONE).await.unwrap().unwrap();
    assert_eq!(record.attempts, 0);
    assert_eq!(record.created_at, clock.now());
}

#[actix_rt::test]
async fn issue_reports_the_first_failed_rule() {
    let (handler, _clock) = handler_with(Arc::new(RecordingChannel::default()));

    let missing_method = IssueVerificationRequest {
        contact_method: None,
        ..issue_request(ContactMethod::Whatsapp, PHONE)
    };
    let cases = [
        (missing_method, Rule::ContactMethodRequired),
        (issue_request(ContactMethod::Whatsapp, ""), Rule::ContactIdRequired),
        (issue_request(ContactMethod::Whatsapp, "0123"), Rule::WhatsappNumberFormat),
        (issue_request(ContactMethod::GoogleChat, "a@b"), Rule::GoogleChatIdFormat),
        (
            IssueVerificationRequest {
                email: "not-an-email".into(),
                ..issue_request(ContactMethod::Whatsapp, PHONE)
            },
            Rule::EmailFormat,
        ),
    ];

    for (request, expected) in cases {
        match handler.issue(request).await {
            Err(AppError::ValidationError(rule)) => assert_eq!(rule, expected),
            other => panic!("expected {:?}, got {:?}", expected, other),
        }
    }
    assert_eq!(handler.store.count().await.unwrap(), 0);
}

#[actix_rt::test]
async fn delivery_failure_leaves_the_record_in_place() {
    let (handler, _clock) = handler_with(Arc::new(RecordingChannel::failing()));

    let result = handler.issue(issue_request(ContactMethod::GoogleChat, "team@chat.example")).await;

    assert!(matches!(result, Err(AppError::DeliveryError(_))));
    assert!(handler.store.get("team@chat.example").await.unwrap().is_some());
}

#[actix_rt::test]
async fn correct_code_verifies_once() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, _clock) = handler_with(channel.clone());
    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let code = channel.last_code(PHONE).unwrap();

    let first = handler.confirm(confirm_request(PHONE, &code)).await.unwrap();
    let second = handler.confirm(confirm_request(PHONE, &code)).await.unwrap();

    assert_eq!(first, ConfirmOutcome::Verified);
    assert_eq!(second, ConfirmOutcome::AlreadyVerified);
    assert!(handler.store.get(PHONE).await.unwrap().unwrap().verified);
}

#[actix_rt::test]
async fn three_wrong_codes_remove_the_record() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, _clock) = handler_with(channel.clone());
    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let wrong = wrong_code(&channel.last_code(PHONE).unwrap());

    let first = handler.confirm(confirm_request(PHONE, &wrong)).await;
    assert!(matches!(first, Err(AppError::InvalidCode { attempts_remaining: 2 })));
    assert_eq!(handler.store.get(PHONE).await.unwrap().unwrap().attempts, 1);

    let second = handler.confirm(confirm_request(PHONE, &wrong)).await;
    assert!(matches!(second, Err(AppError::InvalidCode { attempts_remaining: 1 })));

    let third = handler.confirm(confirm_request(PHONE, &wrong)).await;
    assert!(matches!(third, Err(AppError::RateExceeded { .. })));
    assert!(handler.store.get(PHONE).await.unwrap().is_none());

    let after = handler.confirm(confirm_request(PHONE, &wrong)).await;
    assert!(matches!(after, Err(AppError::NotFound)));
}

#[actix_rt::test]
async fn expired_record_is_rejected_even_with_the_right_code() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, clock) = handler_with(channel.clone());
    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let code = channel.last_code(PHONE).unwrap();

    clock.advance(Duration::minutes(10) + Duration::seconds(1));
    let result = handler.confirm(confirm_request(PHONE, &code)).await;

    assert!(matches!(result, Err(AppError::Expired)));
    assert!(handler.store.get(PHONE).await.unwrap().is_none());
}

#[actix_rt::test]
async fn confirming_an_unknown_contact_is_not_found() {
    let (handler, _clock) = handler_with(Arc::new(RecordingChannel::default()));

    let result = handler.confirm(confirm_request(PHONE, "123456")).await;
    assert!(matches!(result, Err(AppError::NotFound)));

    let missing_code = handler.confirm(confirm_request(PHONE, " ")).await;
    assert!(matches!(missing_code, Err(AppError::ValidationError(Rule::CodeRequired))));
}

#[actix_rt::test]
async fn concurrent_misses_never_exceed_the_ceiling() {
    let channel = Arc::new(RecordingChannel::default());
    let (handler, _clock) = handler_with(channel.clone());
    handler.issue(issue_request(ContactMethod::Whatsapp, PHONE)).await.unwrap();
    let wrong = wrong_code(&channel.last_code(PHONE).unwrap());

    let results = join_all((0..5).map(|_| handler.confirm(confirm_request(PHONE, &wrong)))).await;

    let invalid = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::InvalidCode { .. })))
        .count();
    let exhausted = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::RateExceeded { .. })))
        .count();
    let not_found = results.iter().filter(|r| matches!(r, Err(AppError::NotFound))).count();

    assert_eq!((invalid, exhausted, not_found), (2, 1, 2));
}

#[actix_rt::test]
async fn purge_drops_only_expired_records() {
    let (handler, clock) = handler_with(Arc::new(RecordingChannel::default()));
    handler.store.set("old", record(clock.now() - Duration::minutes(11), true)).await.unwrap();
    handler.store.set("fresh", record(clock.now(), false)).await.unwrap();

    assert_eq!(handler.purge_expired().await.unwrap(), 1);
    assert!(handler.store.get("fresh").await.unwrap().is_some());
}
