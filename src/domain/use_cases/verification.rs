use std::sync::Arc;

use rand::Rng;

use crate::{
    constants::{CODE_MAX, CODE_MIN, ISSUE_SUCCESS_MESSAGE},
    entities::verification::{
        ConfirmOutcome, ConfirmVerificationRequest, IssueVerificationRequest,
        IssueVerificationResponse, VerificationPolicy, VerificationRecord,
    },
    errors::AppError,
    repositories::{
        notifier::VerificationChannel,
        store::{modify, KeyValueStore, Mutation},
    },
    utils::{clock::Clock, mask::mask_contact_id},
    validation::{Rule, RuleSet},
};

pub struct VerificationHandler<S>
where
    S: KeyValueStore<VerificationRecord>,
{
    pub store: S,
    channel: Arc<dyn VerificationChannel>,
    clock: Arc<dyn Clock>,
    policy: VerificationPolicy,
}

impl<S> VerificationHandler<S>
where
    S: KeyValueStore<VerificationRecord>,
{
    pub fn new(
        store: S,
        channel: Arc<dyn VerificationChannel>,
        clock: Arc<dyn Clock>,
        policy: VerificationPolicy,
    ) -> Self {
        VerificationHandler {
            store,
            channel,
            clock,
            policy,
        }
    }

    /// Stores a fresh code for the contact and sends it over the requested channel.
    pub async fn issue(
        &self,
        request: IssueVerificationRequest,
    ) -> Result<IssueVerificationResponse, AppError> {
        request.validate_rules()?;
        let Some(method) = request.contact_method else {
            return Err(AppError::ValidationError(Rule::ContactMethodRequired));
        };

        let contact_id = request.contact_id.trim();
        let now = self.clock.now();
        let policy = self.policy;

        let record = modify(&self.store, contact_id, |current| {
            let live = current.filter(|record| !record.is_expired(now, policy.ttl));

            if let Some(record) = live {
                if record.attempts >= policy.max_attempts {
                    return (Mutation::Keep, Err(AppError::rate_exceeded()));
                }
            }

            let record = VerificationRecord {
                code: generate_code(live.map(|record| record.code.as_str())),
                attempts: live.map_or(0, |record| record.attempts + 1),
                created_at: now,
                verified: false,
                contact_method: method,
                name: request.name.trim().to_string(),
                email: request.email.trim().to_string(),
            };
            (Mutation::Put(record.clone()), Ok(record))
        })
        .await?
        .inspect_err(|_| {
            tracing::warn!(
                event = "VERIFICATION_ATTEMPTS_EXHAUSTED",
                contact = %mask_contact_id(contact_id),
            );
        })?;

        if let Err(e) = self.channel.send_code(method, contact_id, &record.code).await {
            tracing::error!(
                event = "VERIFICATION_DELIVERY_FAILURE",
                contact = %mask_contact_id(contact_id),
                method = %method,
                error = %e,
            );
            return Err(e);
        }

        tracing::info!(
            event = "VERIFICATION_ISSUED",
            contact = %mask_contact_id(contact_id),
            method = %method,
            attempts = record.attempts,
        );

        Ok(IssueVerificationResponse {
            message: ISSUE_SUCCESS_MESSAGE.to_string(),
            expires_in_seconds: policy.ttl.num_seconds(),
        })
    }

    /// Checks a submitted code, counting misses against the attempt ceiling.
    pub async fn confirm(
        &self,
        request: ConfirmVerificationRequest,
    ) -> Result<ConfirmOutcome, AppError> {
        request.validate_rules()?;

        let contact_id = request.contact_id.trim();
        let code = request.code.trim();
        let now = self.clock.now();
        let policy = self.policy;

        let outcome = modify(&self.store, contact_id, |current| {
            let Some(record) = current else {
                return (Mutation::Keep, Err(AppError::NotFound));
            };

            if record.is_expired(now, policy.ttl) {
                return (Mutation::Remove, Err(AppError::Expired));
            }

            if record.code == code {
                if record.verified {
                    return (Mutation::Keep, Ok(ConfirmOutcome::AlreadyVerified));
                }
                let verified = VerificationRecord {
                    verified: true,
                    ..record.clone()
                };
                return (Mutation::Put(verified), Ok(ConfirmOutcome::Verified));
            }

            let attempts = record.attempts + 1;
            if attempts >= policy.max_attempts {
                return (Mutation::Remove, Err(AppError::rate_exceeded()));
            }

            let missed = VerificationRecord {
                attempts,
                ..record.clone()
            };
            (
                Mutation::Put(missed),
                Err(AppError::InvalidCode {
                    attempts_remaining: policy.max_attempts - attempts,
                }),
            )
        })
        .await?;

        match &outcome {
            Ok(result) => tracing::info!(
                event = "VERIFICATION_CONFIRMED",
                contact = %mask_contact_id(contact_id),
                outcome = ?result,
            ),
            Err(e) => tracing::warn!(
                event = "VERIFICATION_REJECTED",
                contact = %mask_contact_id(contact_id),
                reason = e.error_code(),
            ),
        }

        outcome
    }

    /// Drops records past their TTL.
    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        let now = self.clock.now();
        let ttl = self.policy.ttl;
        self.store
            .purge(&move |record: &VerificationRecord| record.is_expired(now, ttl))
            .await
    }

    pub async fn active_count(&self) -> Result<usize, AppError> {
        self.store.count().await
    }
}

/// Uniform six-digit code that differs from `previous`.
pub fn generate_code(previous: Option<&str>) -> String {
    let mut rng = rand::thread_rng();
    loop {
        let code = rng.gen_range(CODE_MIN..=CODE_MAX).to_string();
        if previous != Some(code.as_str()) {
            return code;
        }
    }
}
