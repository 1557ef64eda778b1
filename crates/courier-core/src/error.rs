use courier_persist::PersistError;
use courier_storage::StorageError;
use thiserror::Error;

use crate::telemetry;

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Attachment upload failed for {filename}: {source}")]
    AttachmentUploadFailed {
        filename: String,
        #[source]
        source: StorageError,
    },

    #[error("Thread resolution failed: {0}")]
    ThreadResolutionFailed(String),

    /// The store could not be read while placing the message; retryable
    #[error("Failed to load {target}: {source}")]
    ThreadLookupFailed {
        target: String,
        #[source]
        source: PersistError,
    },

    #[error("Parent message not found: {0}")]
    ParentNotFound(String),

    #[error("Failed to persist message: {0}")]
    PersistenceFailed(#[source] PersistError),

    #[error("Failed to schedule message: {0}")]
    SchedulingFailed(#[source] PersistError),

    #[error("Message not found: {0}")]
    MessageNotFound(String),

    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    #[error("Attachment {index} not found on message {message_id}")]
    AttachmentNotFound { message_id: String, index: usize },

    #[error("Store error: {0}")]
    Store(#[from] PersistError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl SendError {
    /// Short label used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SendError::ValidationFailed(_) => "validation_failed",
            SendError::AttachmentUploadFailed { .. } => "attachment_upload_failed",
            SendError::ThreadResolutionFailed(_) => "thread_resolution_failed",
            SendError::ThreadLookupFailed { .. } => "thread_lookup_failed",
            SendError::ParentNotFound(_) => "parent_not_found",
            SendError::PersistenceFailed(_) => "persistence_failed",
            SendError::SchedulingFailed(_) => "scheduling_failed",
            SendError::MessageNotFound(_) => "message_not_found",
            SendError::ThreadNotFound(_) => "thread_not_found",
            SendError::AttachmentNotFound { .. } => "attachment_not_found",
            SendError::Store(_) => "store",
            SendError::Storage(_) => "storage",
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            SendError::ParentNotFound(_)
            | SendError::MessageNotFound(_)
            | SendError::ThreadNotFound(_)
            | SendError::AttachmentNotFound { .. } => true,
            SendError::Storage(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// A best-effort step that failed after the message was persisted
///
/// Degradations are logged and counted, never returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    Indexing,
    Notification,
    ThreadAggregate,
    ParentUpdate,
}

impl Degradation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degradation::Indexing => "indexing",
            Degradation::Notification => "notification",
            Degradation::ThreadAggregate => "thread_aggregate",
            Degradation::ParentUpdate => "parent_update",
        }
    }

    pub fn record(&self) {
        metrics::counter!(telemetry::DEGRADED_TOTAL, "kind" => self.as_str()).increment(1);
    }
}
