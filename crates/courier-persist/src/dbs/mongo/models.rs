use mongodb::bson::{self, oid::ObjectId};
use serde::{Deserialize, Serialize};

use courier_types::{
    Attachment, EmailContent, EmailFlags, EmailMessage, EmailMetadata, LastMessage, MessageStatus,
    Participant, ScheduledTask, StaffProfile, TaskPriority, TaskStatus, ThreadAggregate,
    ThreadLineage,
};

/// Lineage as stored, with BSON dates so `$max` compares chronologically
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLineage {
    pub depth: i32,
    pub root_id: String,
    pub path: Vec<String>,
    #[serde(default)]
    pub reply_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reply_at: Option<bson::DateTime>,
}

/// MongoDB-specific email model (uses ObjectId)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoEmail {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
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
    pub flags: EmailFlags,
    pub thread_info: MongoLineage,
    pub metadata: EmailMetadata,
    pub status: MessageStatus,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoLastMessage {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub sent_at: bson::DateTime,
}

/// MongoDB-specific thread aggregate, keyed by thread id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoThread {
    #[serde(rename = "_id")]
    pub thread_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub last_message: Option<MongoLastMessage>,
    #[serde(default)]
    pub message_count: i64,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MongoProfilePhoto {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub storage_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStaff {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub profile_photo: MongoProfilePhoto,
    #[serde(default)]
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTask {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub task_type: String,
    pub payload: String,
    pub run_at: bson::DateTime,
    pub priority: i32,
    pub status: TaskStatus,
    #[serde(default)]
    pub attempts: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lease_until: Option<bson::DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

/// Search document, keyed by message id so re-indexing overwrites
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSearchDoc {
    #[serde(rename = "_id")]
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub recipients: Vec<String>,
    pub body: String,
    pub snippet: String,
    pub created_at: bson::DateTime,
    #[serde(default, skip_serializing)]
    pub score: Option<f64>,
}

// Conversions between database-agnostic and MongoDB-specific models

impl From<&ThreadLineage> for MongoLineage {
    fn from(lineage: &ThreadLineage) -> Self {
        Self {
            depth: lineage.depth as i32,
            root_id: lineage.root_id.clone(),
            path: lineage.path.clone(),
            reply_count: lineage.reply_count as i64,
            last_reply_at: lineage.last_reply_at.map(bson::DateTime::from_chrono),
        }
    }
}

impl From<MongoLineage> for ThreadLineage {
    fn from(lineage: MongoLineage) -> Self {
        Self {
            depth: lineage.depth.max(0) as u32,
            root_id: lineage.root_id,
            path: lineage.path,
            reply_count: lineage.reply_count.max(0) as u64,
            last_reply_at: lineage.last_reply_at.map(|d| d.to_chrono()),
        }
    }
}

impl From<&EmailMessage> for MongoEmail {
    fn from(msg: &EmailMessage) -> Self {
        // Unpersisted messages get a fresh ObjectId
        let id = ObjectId::parse_str(&msg.id).unwrap_or_else(|_| ObjectId::new());

        Self {
            id,
            message_id: msg.message_id.clone(),
            thread_id: msg.thread_id.clone(),
            parent_message_id: msg.parent_message_id.clone(),
            from: msg.from.clone(),
            to: msg.to.clone(),
            cc: msg.cc.clone(),
            bcc: msg.bcc.clone(),
            subject: msg.subject.clone(),
            content: msg.content.clone(),
            attachments: msg.attachments.clone(),
            labels: msg.labels.clone(),
            flags: msg.flags,
            thread_info: MongoLineage::from(&msg.thread_info),
            metadata: msg.metadata.clone(),
            status: msg.status,
            created_at: bson::DateTime::from_chrono(msg.created_at),
            updated_at: bson::DateTime::from_chrono(msg.updated_at),
        }
    }
}

impl From<MongoEmail> for EmailMessage {
    fn from(msg: MongoEmail) -> Self {
        Self {
            id: msg.id.to_hex(),
            message_id: msg.message_id,
            thread_id: msg.thread_id,
            parent_message_id: msg.parent_message_id,
            from: msg.from,
            to: msg.to,
            cc: msg.cc,
            bcc: msg.bcc,
            subject: msg.subject,
            content: msg.content,
            attachments: msg.attachments,
            labels: msg.labels,
            flags: msg.flags,
            thread_info: msg.thread_info.into(),
            metadata: msg.metadata,
            status: msg.status,
            created_at: msg.created_at.to_chrono(),
            updated_at: msg.updated_at.to_chrono(),
        }
    }
}

impl From<&LastMessage> for MongoLastMessage {
    fn from(last: &LastMessage) -> Self {
        Self {
            message_id: last.message_id.clone(),
            from: last.from.clone(),
            subject: last.subject.clone(),
            snippet: last.snippet.clone(),
            sent_at: bson::DateTime::from_chrono(last.sent_at),
        }
    }
}

impl From<MongoLastMessage> for LastMessage {
    fn from(last: MongoLastMessage) -> Self {
        Self {
            message_id: last.message_id,
            from: last.from,
            subject: last.subject,
            snippet: last.snippet,
            sent_at: last.sent_at.to_chrono(),
        }
    }
}

impl From<MongoThread> for ThreadAggregate {
    fn from(thread: MongoThread) -> Self {
        Self {
            thread_id: thread.thread_id,
            subject: thread.subject,
            participants: thread.participants,
            last_message: thread.last_message.map(Into::into),
            message_count: thread.message_count.max(0) as u64,
            created_at: thread.created_at.to_chrono(),
            updated_at: thread.updated_at.to_chrono(),
        }
    }
}

impl From<MongoStaff> for StaffProfile {
    fn from(staff: MongoStaff) -> Self {
        Self {
            email: staff.email,
            full_name: staff.full_name,
            role: staff.role,
            department: staff.department,
            profile_photo_url: staff.profile_photo.url,
            status: staff.status,
        }
    }
}

impl From<&ScheduledTask> for MongoTask {
    fn from(task: &ScheduledTask) -> Self {
        let id = ObjectId::parse_str(&task.id).unwrap_or_else(|_| ObjectId::new());
        let created_at = bson::DateTime::from_chrono(task.created_at);

        Self {
            id,
            task_type: task.task_type.clone(),
            payload: task.payload.clone(),
            run_at: bson::DateTime::from_chrono(task.run_at),
            priority: task.priority.rank(),
            status: task.status,
            attempts: task.attempts as i32,
            lease_until: task.lease_until.map(bson::DateTime::from_chrono),
            last_error: task.last_error.clone(),
            created_at,
            updated_at: created_at,
        }
    }
}

impl From<MongoTask> for ScheduledTask {
    fn from(task: MongoTask) -> Self {
        Self {
            id: task.id.to_hex(),
            task_type: task.task_type,
            payload: task.payload,
            run_at: task.run_at.to_chrono(),
            priority: TaskPriority::from_rank(task.priority),
            status: task.status,
            attempts: task.attempts.max(0) as u32,
            lease_until: task.lease_until.map(|d| d.to_chrono()),
            last_error: task.last_error,
            created_at: task.created_at.to_chrono(),
        }
    }
}

impl From<&EmailMessage> for MongoSearchDoc {
    fn from(msg: &EmailMessage) -> Self {
        // Blind copies stay out of the index so they cannot be searched for
        let recipients = msg
            .to
            .iter()
            .chain(msg.cc.iter())
            .map(|p| p.email.clone())
            .collect();

        Self {
            message_id: msg.message_id.clone(),
            thread_id: msg.thread_id.clone(),
            subject: msg.subject.clone(),
            from: msg.from.email.clone(),
            recipients,
            body: msg.content.text.clone(),
            snippet: courier_types::truncate_text(&msg.content.text, courier_types::PREVIEW_MAX_CHARS),
            created_at: bson::DateTime::from_chrono(msg.created_at),
            score: None,
        }
    }
}
