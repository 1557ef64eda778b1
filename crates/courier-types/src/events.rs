use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailMessage;
use crate::text::{truncate_text, PREVIEW_MAX_CHARS};

pub const NEW_EMAIL_EVENT: &str = "new_email";

/// Lightweight event pushed to a recipient's live channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub from: String,
    pub subject: String,
    pub preview: String,
    pub sent_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new_email(message: &EmailMessage) -> Self {
        Self {
            event_type: NEW_EMAIL_EVENT.to_string(),
            message_id: message.message_id.clone(),
            thread_id: message.thread_id.clone(),
            from: message.from.email.clone(),
            subject: message.subject.clone(),
            preview: truncate_text(&message.content.text, PREVIEW_MAX_CHARS),
            sent_at: message.created_at,
        }
    }
}
