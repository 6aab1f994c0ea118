use std::sync::Arc;

use crate::{
    constants::CONTACT_SUCCESS_MESSAGE,
    entities::{
        client::ClientContext,
        contact::{ContactForm, MessageResponse},
    },
    errors::AppError,
    messages,
    use_cases::{
        booking::Notifiers,
        notifications::{dispatch_email, notify_push},
    },
    utils::clock::Clock,
    validation::RuleSet,
};

pub struct ContactHandler {
    notifiers: Notifiers,
    clock: Arc<dyn Clock>,
}

impl ContactHandler {
    pub fn new(notifiers: Notifiers, clock: Arc<dyn Clock>) -> Self {
        ContactHandler { notifiers, clock }
    }

    /// Validates a contact form submission and forwards it to the operator.
    pub async fn submit(
        &self,
        form: ContactForm,
        client: &ClientContext,
    ) -> Result<MessageResponse, AppError> {
        if let Err(e) = form.validate_rules() {
            tracing::warn!(event = "INVALID_REQUEST", ip = %client.ip, reason = %e);
            return Err(e);
        }

        let agent = self
            .notifiers
            .user_agents
            .parse(client.user_agent.as_deref().unwrap_or_default());

        let email = messages::contact_submission(
            &self.notifiers.operator_address,
            &form,
            client,
            &agent,
            self.clock.now(),
        );

        dispatch_email(self.notifiers.mailer.as_ref(), &email, "contact_submission").await?;

        tracing::info!(event = "SUBMISSION_SUCCESS", ip = %client.ip, email = %form.email);

        notify_push(self.notifiers.push.as_ref(), &messages::contact_push(&form)).await;

        Ok(MessageResponse::new(CONTACT_SUCCESS_MESSAGE))
    }
}
