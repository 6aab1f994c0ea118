use std::sync::Arc;

use crate::{
    entities::notification::{OutgoingEmail, PushMessage},
    errors::AppError,
    repositories::notifier::{EmailSender, PushNotifier},
};

/// Sends one email and logs the outcome; the error is returned untouched.
pub async fn dispatch_email(
    mailer: &dyn EmailSender,
    email: &OutgoingEmail,
    kind: &'static str,
) -> Result<(), AppError> {
    match mailer.send(email).await {
        Ok(()) => {
            tracing::info!(event = "EMAIL_SENT", kind, recipients = email.to.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!(event = "EMAIL_SEND_FAILURE", kind, error = %e);
            Err(e)
        }
    }
}

/// Best-effort push; failures are logged and swallowed.
pub async fn notify_push(push: Option<&Arc<dyn PushNotifier>>, message: &PushMessage) {
    let Some(push) = push else {
        return;
    };

    if let Err(e) = push.notify(message).await {
        tracing::warn!(event = "PUSH_SEND_FAILURE", title = %message.title, error = %e);
    }
}
