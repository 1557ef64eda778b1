use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::thread::ThreadLineage;

/// A resolved sender or recipient identity
///
/// Participants are never stored on their own; they are embedded in
/// messages and thread aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    pub email: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub profile_photo: String,
}

impl Participant {
    /// Identity carrying nothing but the address
    pub fn address_only(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            full_name: String::new(),
            profile_photo: String::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.full_name.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContent {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
}

impl EmailContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

/// Metadata for a payload stored in object storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub storage_key: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailFlags {
    pub is_read: bool,
    pub is_starred: bool,
    pub is_scheduled: bool,
    pub is_draft: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub client_ip: String,
    #[serde(default)]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Scheduled,
    Sent,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Scheduled => "scheduled",
            MessageStatus::Sent => "sent",
        }
    }
}

/// Database-agnostic email envelope
///
/// `message_id` is assigned once at construction and is the correlation key
/// used by the thread lineage, the search index, notifications and the
/// scheduled task queue. `id` is the document store's own identifier and is
/// empty until the message has been persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: String,
    pub message_id: String,
    pub thread_id: Option<String>,
    pub parent_message_id: Option<String>,
    pub from: Participant,
    pub to: Vec<Participant>,
    #[serde(default)]
    pub cc: Vec<Participant>,
    #[serde(default)]
    pub bcc: Vec<Participant>,
    pub subject: String,
    pub content: EmailContent,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub flags: EmailFlags,
    #[serde(default)]
    pub thread_info: ThreadLineage,
    #[serde(default)]
    pub metadata: EmailMetadata,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmailMessage {
    /// Start a pending message with a fresh message id
    pub fn pending(from: Participant, subject: impl Into<String>, content: EmailContent) -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            message_id: uuid::Uuid::new_v4().to_string(),
            thread_id: None,
            parent_message_id: None,
            from,
            to: Vec::new(),
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: subject.into(),
            content,
            attachments: Vec::new(),
            labels: Vec::new(),
            flags: EmailFlags::default(),
            thread_info: ThreadLineage::default(),
            metadata: EmailMetadata::default(),
            status: MessageStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn is_reply(&self) -> bool {
        self.thread_info.depth > 0
    }

    /// Every participant on the envelope, sender first
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.from)
            .chain(self.to.iter())
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
    }
}
