use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use courier_persist::SearchHit;
use courier_types::{
    Attachment, EmailMessage, LastMessage, Participant, ThreadAggregate, ThreadLineage,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachmentUpload {
    pub filename: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Standard base64 payload
    pub content_base64: String,
}

fn default_content_type() -> String {
    "application/octet-stream".to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendEmailRequest {
    pub from: String,
    pub to: Vec<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
    pub subject: String,
    pub text: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentUpload>,
    #[serde(default)]
    pub thread_id: Option<String>,
    /// Message id being replied to
    #[serde(default)]
    pub in_reply_to: Option<String>,
    /// Deliver at this time instead of now
    #[serde(default)]
    pub schedule_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub email: String,
    pub full_name: String,
    pub profile_photo: String,
}

impl From<&Participant> for ParticipantResponse {
    fn from(p: &Participant) -> Self {
        Self {
            email: p.email.clone(),
            full_name: p.full_name.clone(),
            profile_photo: p.profile_photo.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttachmentResponse {
    pub index: usize,
    pub filename: String,
    pub content_type: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    /// Download path relative to the API root
    pub url: String,
}

impl AttachmentResponse {
    fn new(message_id: &str, index: usize, attachment: &Attachment) -> Self {
        Self {
            index,
            filename: attachment.filename.clone(),
            content_type: attachment.content_type.clone(),
            size: attachment.size,
            uploaded_at: attachment.uploaded_at,
            url: format!("/emails/{}/attachments/{}", message_id, index),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineageResponse {
    pub depth: u32,
    pub root_id: String,
    pub path: Vec<String>,
    pub reply_count: u64,
    pub last_reply_at: Option<DateTime<Utc>>,
}

impl From<&ThreadLineage> for LineageResponse {
    fn from(lineage: &ThreadLineage) -> Self {
        Self {
            depth: lineage.depth,
            root_id: lineage.root_id.clone(),
            path: lineage.path.clone(),
            reply_count: lineage.reply_count,
            last_reply_at: lineage.last_reply_at,
        }
    }
}

/// A message as seen through the API; blind copies are never listed
#[derive(Debug, Serialize, ToSchema)]
pub struct EmailResponse {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub parent_message_id: Option<String>,
    pub from: ParticipantResponse,
    pub to: Vec<ParticipantResponse>,
    pub cc: Vec<ParticipantResponse>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentResponse>,
    pub labels: Vec<String>,
    pub status: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub is_scheduled: bool,
    pub is_draft: bool,
    pub thread_info: LineageResponse,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&EmailMessage> for EmailResponse {
    fn from(msg: &EmailMessage) -> Self {
        Self {
            message_id: msg.message_id.clone(),
            thread_id: msg.thread_id.clone(),
            parent_message_id: msg.parent_message_id.clone(),
            from: (&msg.from).into(),
            to: msg.to.iter().map(Into::into).collect(),
            cc: msg.cc.iter().map(Into::into).collect(),
            subject: msg.subject.clone(),
            text: msg.content.text.clone(),
            html: msg.content.html.clone(),
            attachments: msg
                .attachments
                .iter()
                .enumerate()
                .map(|(i, a)| AttachmentResponse::new(&msg.message_id, i, a))
                .collect(),
            labels: msg.labels.clone(),
            status: msg.status.as_str().to_string(),
            is_read: msg.flags.is_read,
            is_starred: msg.flags.is_starred,
            is_scheduled: msg.flags.is_scheduled,
            is_draft: msg.flags.is_draft,
            thread_info: (&msg.thread_info).into(),
            scheduled_for: msg.metadata.scheduled_for,
            created_at: msg.created_at,
            updated_at: msg.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LastMessageResponse {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub sent_at: DateTime<Utc>,
}

impl From<LastMessage> for LastMessageResponse {
    fn from(last: LastMessage) -> Self {
        Self {
            message_id: last.message_id,
            from: last.from,
            subject: last.subject,
            snippet: last.snippet,
            sent_at: last.sent_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ThreadResponse {
    pub thread_id: String,
    pub subject: String,
    pub participants: Vec<ParticipantResponse>,
    pub last_message: Option<LastMessageResponse>,
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ThreadAggregate> for ThreadResponse {
    fn from(thread: ThreadAggregate) -> Self {
        Self {
            participants: thread.participants.iter().map(Into::into).collect(),
            thread_id: thread.thread_id,
            subject: thread.subject,
            last_message: thread.last_message.map(Into::into),
            message_count: thread.message_count,
            created_at: thread.created_at,
            updated_at: thread.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchHitResponse {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub snippet: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

impl From<SearchHit> for SearchHitResponse {
    fn from(hit: SearchHit) -> Self {
        Self {
            message_id: hit.message_id,
            thread_id: hit.thread_id,
            subject: hit.subject,
            from: hit.from,
            snippet: hit.snippet,
            score: hit.score,
            created_at: hit.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<SearchHitResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
    pub version: String,
}
