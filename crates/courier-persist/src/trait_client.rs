use async_trait::async_trait;
use chrono::{DateTime, Utc};

use courier_types::{EmailMessage, ScheduledTask, StaffProfile, ThreadAggregate};

use crate::error::Result;
use crate::models::{SearchHit, ThreadAppend};

/// Document-store operations for messages and thread aggregates
///
/// Every write is a single-document operation. Counters are only ever
/// changed through atomic increments performed by the store itself.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Insert a new message, returning the store-assigned id
    async fn insert_message(&self, message: &EmailMessage) -> Result<String>;

    /// Find a message by its message id
    async fn find_message(&self, message_id: &str) -> Result<Option<EmailMessage>>;

    /// Replace an existing message, matched by message id
    async fn update_message(&self, message: &EmailMessage) -> Result<()>;

    /// Delete a message by message id
    async fn delete_message(&self, message_id: &str) -> Result<()>;

    /// Atomically bump the parent's reply count and last-reply timestamp
    ///
    /// Returns `MessageNotFound` when no message has `parent_message_id`.
    async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) -> Result<()>;

    /// Messages of a thread in creation order
    async fn list_thread_messages(
        &self,
        thread_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<EmailMessage>>;

    /// Fold a message into its thread aggregate, creating it on first use
    ///
    /// The message count increments by exactly one per call; the last-message
    /// snapshot is only replaced by a newer one.
    async fn append_to_thread(&self, append: &ThreadAppend) -> Result<()>;

    /// Get a thread aggregate
    async fn get_thread(&self, thread_id: &str) -> Result<Option<ThreadAggregate>>;
}

/// Staff directory lookup
#[async_trait]
pub trait StaffDirectory: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<StaffProfile>>;
}

/// Durable deferred-work queue
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Enqueue a task, returning its id
    async fn schedule(&self, task: ScheduledTask) -> Result<String>;

    /// Claim up to `limit` due tasks, marking them running until `lease_until`
    ///
    /// Highest priority first, then earliest `run_at`. A running task whose
    /// lease has expired is claimable again. A live claim is held by exactly
    /// one caller.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<ScheduledTask>>;

    /// Mark a claimed task done
    async fn complete(&self, task_id: &str) -> Result<()>;

    /// Mark a claimed task failed with the error that stopped it
    async fn fail(&self, task_id: &str, error: &str) -> Result<()>;
}

/// Full-text index over messages
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index (or re-index) a message
    async fn index(&self, message: &EmailMessage) -> Result<()>;

    /// Search messages, best match first
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<SearchHit>>;
}
