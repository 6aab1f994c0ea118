use std::sync::Arc;

use futures_util::future::join;
use uuid::Uuid;

use crate::{
    constants::BOOKING_SUCCESS_MESSAGE,
    entities::{
        booking::{BookingRequest, BookingResponse},
        client::ClientContext,
        verification::{VerificationPolicy, VerificationRecord},
    },
    errors::AppError,
    messages::{self, Slot},
    repositories::{
        notifier::{EmailSender, PushNotifier, UserAgentParser},
        store::{modify, KeyValueStore, Mutation},
    },
    use_cases::notifications::{dispatch_email, notify_push},
    utils::{clock::Clock, mask::mask_contact_id},
    validation::RuleSet,
};

/// Outbound collaborators shared by booking and the contact form.
#[derive(Clone)]
pub struct Notifiers {
    pub mailer: Arc<dyn EmailSender>,
    pub push: Option<Arc<dyn PushNotifier>>,
    pub user_agents: Arc<dyn UserAgentParser>,
    pub operator_address: String,
}

pub struct BookingHandler<S>
where
    S: KeyValueStore<VerificationRecord>,
{
    store: S,
    notifiers: Notifiers,
    clock: Arc<dyn Clock>,
    policy: VerificationPolicy,
}

impl<S> BookingHandler<S>
where
    S: KeyValueStore<VerificationRecord>,
{
    pub fn new(store: S, notifiers: Notifiers, clock: Arc<dyn Clock>, policy: VerificationPolicy) -> Self {
        BookingHandler {
            store,
            notifiers,
            clock,
            policy,
        }
    }

    /// Consumes a verified record and sends the confirmation and operator emails.
    ///
    /// The record is removed before any email goes out, so a failed send
    /// still requires a new verification.
    pub async fn book(
        &self,
        request: BookingRequest,
        client: &ClientContext,
    ) -> Result<BookingResponse, AppError> {
        request.validate_rules()?;

        let contact_id = request.contact_id.trim();
        let now = self.clock.now();
        let ttl = self.policy.ttl;

        let record = modify(&self.store, contact_id, |current| match current {
            Some(record) if record.is_bookable(now, ttl) => (Mutation::Remove, Ok(record.clone())),
            Some(record) if record.verified => (Mutation::Remove, Err(AppError::Expired)),
            _ => (Mutation::Keep, Err(AppError::NotVerified)),
        })
        .await?
        .inspect_err(|e| {
            tracing::warn!(
                event = "BOOKING_REJECTED",
                contact = %mask_contact_id(contact_id),
                ip = %client.ip,
                reason = e.error_code(),
            );
        })?;

        let slot = Slot {
            date: request.date.trim(),
            time: request.time.trim(),
        };
        let agent = self
            .notifiers
            .user_agents
            .parse(client.user_agent.as_deref().unwrap_or_default());

        let confirmation = messages::booking_confirmation(&record, slot);
        let notice = messages::booking_notice(
            &self.notifiers.operator_address,
            &record,
            contact_id,
            slot,
            &agent,
        );

        let mailer = self.notifiers.mailer.as_ref();
        let (to_client, to_operator) = join(
            dispatch_email(mailer, &confirmation, "booking_confirmation"),
            dispatch_email(mailer, &notice, "booking_notice"),
        )
        .await;

        notify_push(self.notifiers.push.as_ref(), &messages::booking_push(&record, slot)).await;

        to_client?;
        to_operator?;

        let reference = Uuid::new_v4();
        tracing::info!(
            event = "BOOKING_CONFIRMED",
            contact = %mask_contact_id(contact_id),
            method = %record.contact_method,
            reference = %reference,
            date = slot.date,
            time = slot.time,
        );

        Ok(BookingResponse {
            message: BOOKING_SUCCESS_MESSAGE.to_string(),
            reference,
        })
    }
}
