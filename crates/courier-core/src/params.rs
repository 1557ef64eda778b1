use chrono::{DateTime, Utc};

use crate::error::SendError;

/// A raw attachment payload to be uploaded
#[derive(Debug, Clone)]
pub struct AttachmentInput {
    pub filename: String,
    pub content: Vec<u8>,
    pub content_type: String,
}

/// Caller details recorded in the message metadata
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

#[derive(Debug, Clone, Default)]
pub struct SendEmailParams {
    pub from: String,
    pub to: Vec<String>,
    pub cc: Vec<String>,
    pub bcc: Vec<String>,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
    pub attachments: Vec<AttachmentInput>,
    pub thread_id: Option<String>,
    /// Message id of the message being replied to
    pub in_reply_to: Option<String>,
    /// Deliver later instead of now
    pub schedule: Option<DateTime<Utc>>,
    pub client: ClientInfo,
}

impl SendEmailParams {
    /// Reject malformed input before anything is written
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), SendError> {
        if !is_valid_address(&self.from) {
            return Err(invalid(format!("invalid sender address '{}'", self.from)));
        }
        if self.to.is_empty() {
            return Err(invalid("at least one recipient is required"));
        }
        if let Some(bad) = self
            .to
            .iter()
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
            .find(|address| !is_valid_address(address))
        {
            return Err(invalid(format!("invalid recipient address '{}'", bad)));
        }
        if self.subject.trim().is_empty() {
            return Err(invalid("subject is required"));
        }
        if self.text.trim().is_empty() {
            return Err(invalid("message text is required"));
        }
        if self.attachments.iter().any(|a| a.filename.trim().is_empty()) {
            return Err(invalid("attachment filename is required"));
        }
        if matches!(self.thread_id.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(invalid("thread id must not be empty"));
        }
        if matches!(self.in_reply_to.as_deref(), Some(id) if id.trim().is_empty()) {
            return Err(invalid("in_reply_to must not be empty"));
        }
        if let Some(at) = self.schedule {
            if at <= now {
                return Err(invalid("scheduled time must be in the future"));
            }
        }
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> SendError {
    SendError::ValidationFailed(reason.into())
}

fn is_valid_address(address: &str) -> bool {
    match address.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
