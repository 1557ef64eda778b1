use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courier_types::{EmailMessage, LastMessage, Participant};

/// One message being folded into its thread's aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadAppend {
    pub thread_id: String,
    pub subject: String,
    pub participants: Vec<Participant>,
    pub last_message: LastMessage,
    pub appended_at: DateTime<Utc>,
}

impl ThreadAppend {
    /// Build the append for a threaded message
    ///
    /// Blind-copied recipients are left out of the participant set, which is
    /// visible to everyone reading the thread. Returns `None` for a message
    /// that has not been assigned to a thread.
    pub fn from_message(message: &EmailMessage) -> Option<Self> {
        let thread_id = message.thread_id.clone()?;

        let mut participants: Vec<Participant> = Vec::new();
        for p in std::iter::once(&message.from)
            .chain(message.to.iter())
            .chain(message.cc.iter())
        {
            if !participants.iter().any(|existing| existing.email.eq_ignore_ascii_case(&p.email)) {
                participants.push(p.clone());
            }
        }

        Some(Self {
            thread_id,
            subject: message.subject.clone(),
            participants,
            last_message: LastMessage::from(message),
            appended_at: message.created_at,
        })
    }
}

/// A single full-text search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub subject: String,
    pub from: String,
    pub snippet: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}
