use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::{EmailMessage, Participant};
use crate::text::{truncate_text, PREVIEW_MAX_CHARS};

/// Position of a message inside its reply tree
///
/// `path` always starts at `root_id` and ends at the message itself, so
/// `path.len() == depth + 1`. `reply_count` and `last_reply_at` are only ever
/// changed by atomic store operations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadLineage {
    pub depth: u32,
    pub root_id: String,
    pub path: Vec<String>,
    #[serde(default)]
    pub reply_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reply_at: Option<DateTime<Utc>>,
}

impl ThreadLineage {
    /// Lineage of a message that starts a new thread
    pub fn root(message_id: &str) -> Self {
        Self {
            depth: 0,
            root_id: message_id.to_string(),
            path: vec![message_id.to_string()],
            reply_count: 0,
            last_reply_at: None,
        }
    }

    /// Lineage of a direct reply to the message owning `self`
    pub fn extend(&self, message_id: &str) -> Self {
        let mut path = self.path.clone();
        path.push(message_id.to_string());
        Self {
            depth: self.depth + 1,
            root_id: self.root_id.clone(),
            path,
            reply_count: 0,
            last_reply_at: None,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.path.len() == self.depth as usize + 1
            && self.path.first().map(String::as_str) == Some(self.root_id.as_str())
    }
}

/// Snapshot of the newest message in a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMessage {
    pub message_id: String,
    pub from: String,
    pub subject: String,
    pub snippet: String,
    pub sent_at: DateTime<Utc>,
}

impl From<&EmailMessage> for LastMessage {
    fn from(msg: &EmailMessage) -> Self {
        Self {
            message_id: msg.message_id.clone(),
            from: msg.from.email.clone(),
            subject: msg.subject.clone(),
            snippet: truncate_text(&msg.content.text, PREVIEW_MAX_CHARS),
            sent_at: msg.created_at,
        }
    }
}

/// Denormalized per-thread summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadAggregate {
    pub thread_id: String,
    pub subject: String,
    pub participants: Vec<Participant>,
    pub last_message: Option<LastMessage>,
    pub message_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
