use std::sync::Arc;

use chrono::{DateTime, Utc};

use courier_persist::EmailStore;
use courier_types::{EmailMessage, ThreadLineage};

use crate::error::{Degradation, SendError};

/// Places a message in its conversation
///
/// Lineage is derived from the parent's stored lineage; the parent's reply
/// counters are only ever bumped by the store's atomic update in
/// [`ThreadLinker::record_reply`].
pub struct ThreadLinker {
    store: Arc<dyn EmailStore>,
}

impl ThreadLinker {
    pub fn new(store: Arc<dyn EmailStore>) -> Self {
        Self { store }
    }

    /// Stamp `thread_id`, `parent_message_id` and `thread_info` on `message`
    ///
    /// - no thread and no parent: the message starts a new thread
    /// - a parent: the message extends the parent's path and joins its thread
    /// - a thread only: the message replies to the thread's latest message
    pub async fn link(&self, message: &mut EmailMessage) -> Result<(), SendError> {
        let parent_id = match (&message.parent_message_id, &message.thread_id) {
            (Some(parent_id), _) => parent_id.clone(),
            (None, Some(thread_id)) => self.latest_in_thread(thread_id).await?,
            (None, None) => {
                message.thread_id = Some(uuid::Uuid::new_v4().to_string());
                message.thread_info = ThreadLineage::root(&message.message_id);
                return Ok(());
            }
        };

        let parent = self
            .store
            .find_message(&parent_id)
            .await
            .map_err(|source| SendError::ThreadLookupFailed {
                target: format!("parent {}", parent_id),
                source,
            })?
            .ok_or_else(|| SendError::ParentNotFound(parent_id.clone()))?;

        let Some(parent_thread) = parent.thread_id.clone() else {
            return Err(SendError::ThreadResolutionFailed(format!(
                "parent {} does not belong to a thread",
                parent_id
            )));
        };

        if let Some(requested) = message.thread_id.as_deref() {
            if requested != parent_thread {
                tracing::warn!(
                    message_id = %message.message_id,
                    requested_thread = %requested,
                    parent_thread = %parent_thread,
                    "Reply joins its parent's thread"
                );
            }
        }

        message.thread_id = Some(parent_thread);
        message.parent_message_id = Some(parent.message_id.clone());
        message.thread_info = parent.thread_info.extend(&message.message_id);
        Ok(())
    }

    /// Bump the parent's reply count and last-reply time
    ///
    /// Failure leaves the reply itself intact and is only logged.
    pub async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) {
        if let Err(e) = self.store.record_reply(parent_message_id, replied_at).await {
            tracing::error!(
                parent_message_id = %parent_message_id,
                error = %e,
                "Failed to update parent reply counters"
            );
            Degradation::ParentUpdate.record();
        }
    }

    async fn latest_in_thread(&self, thread_id: &str) -> Result<String, SendError> {
        let thread = self
            .store
            .get_thread(thread_id)
            .await
            .map_err(|source| SendError::ThreadLookupFailed {
                target: format!("thread {}", thread_id),
                source,
            })?
            .ok_or_else(|| SendError::ThreadResolutionFailed(format!("unknown thread {}", thread_id)))?;

        thread
            .last_message
            .map(|last| last.message_id)
            .ok_or_else(|| SendError::ThreadResolutionFailed(format!("thread {} has no messages", thread_id)))
    }
}
