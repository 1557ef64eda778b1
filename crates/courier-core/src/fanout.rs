use std::sync::Arc;

use courier_types::{EmailMessage, NotificationEvent};

use crate::dispatcher::Dispatcher;
use crate::error::Degradation;
use crate::realtime::{Notifier, NotifyError};
use crate::telemetry;

/// Pushes a `new_email` event to every visible recipient
///
/// Each recipient is its own dispatcher job, so a slow or failing channel
/// cannot hold up or fail the others.
pub struct NotificationFanout {
    notifier: Arc<dyn Notifier>,
    dispatcher: Arc<Dispatcher>,
}

impl NotificationFanout {
    pub fn new(notifier: Arc<dyn Notifier>, dispatcher: Arc<Dispatcher>) -> Self {
        Self { notifier, dispatcher }
    }

    /// To and Cc addresses, first spelling wins on case-insensitive duplicates
    ///
    /// Bcc recipients are never notified.
    pub fn recipients(message: &EmailMessage) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        let mut recipients = Vec::new();

        for participant in message.to.iter().chain(message.cc.iter()) {
            let key = participant.email.to_lowercase();
            if !seen.contains(&key) {
                seen.push(key);
                recipients.push(participant.email.clone());
            }
        }
        recipients
    }

    /// Submit one notification job per recipient, returning how many were queued
    pub fn fan_out(&self, message: &EmailMessage) -> usize {
        let event = Arc::new(NotificationEvent::new_email(message));
        let mut queued = 0;

        for recipient in Self::recipients(message) {
            let notifier = Arc::clone(&self.notifier);
            let event = Arc::clone(&event);

            let accepted = self.dispatcher.submit("notify", async move {
                match notifier.notify_user(&recipient, &event).await {
                    Ok(()) => {
                        metrics::counter!(telemetry::NOTIFICATIONS_SENT_TOTAL).increment(1);
                    }
                    Err(NotifyError::NoSubscribers(_)) => {
                        tracing::debug!(recipient = %recipient, message_id = %event.message_id, "Recipient not connected");
                    }
                    Err(e) => {
                        tracing::warn!(
                            recipient = %recipient,
                            message_id = %event.message_id,
                            error = %e,
                            "Failed to notify recipient"
                        );
                        Degradation::Notification.record();
                    }
                }
            });

            if accepted {
                queued += 1;
            } else {
                Degradation::Notification.record();
            }
        }
        queued
    }
}
