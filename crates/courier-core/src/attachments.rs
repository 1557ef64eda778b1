use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use futures::future::{join_all, try_join_all};

use courier_storage::{ObjectStore, StoredObject};
use courier_types::Attachment;

use crate::error::SendError;
use crate::params::AttachmentInput;

const KEY_PREFIX: &str = "attachments";

/// Fresh storage key for an upload attempt
pub fn storage_key(filename: &str) -> String {
    format!("{}/{}/{}", KEY_PREFIX, uuid::Uuid::new_v4(), filename)
}

/// Uploads attachment payloads and describes where they landed
pub struct AttachmentProcessor {
    objects: Arc<dyn ObjectStore>,
}

impl AttachmentProcessor {
    pub fn new(objects: Arc<dyn ObjectStore>) -> Self {
        Self { objects }
    }

    /// Upload one payload under a new key
    pub async fn process(&self, input: &AttachmentInput) -> Result<Attachment, SendError> {
        self.upload(input, storage_key(&input.filename)).await
    }

    /// Upload every payload concurrently, all or nothing
    ///
    /// The first failure abandons the remaining uploads and every key handed
    /// out for this batch is deleted. On success the result follows input
    /// order.
    pub async fn process_all(&self, inputs: &[AttachmentInput]) -> Result<Vec<Attachment>, SendError> {
        let keys: Vec<String> = inputs.iter().map(|input| storage_key(&input.filename)).collect();

        let uploads = inputs
            .iter()
            .zip(keys.iter())
            .map(|(input, key)| self.upload(input, key.clone()));

        match try_join_all(uploads).await {
            Ok(attachments) => Ok(attachments),
            Err(e) => {
                tracing::warn!(error = %e, batch = keys.len(), "Attachment batch failed, removing uploaded objects");
                self.delete_keys(&keys).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal of stored attachments
    pub async fn discard(&self, attachments: &[Attachment]) {
        let keys: Vec<String> = attachments.iter().map(|a| a.storage_key.clone()).collect();
        self.delete_keys(&keys).await;
    }

    pub async fn download(&self, storage_key: &str) -> Result<StoredObject, SendError> {
        Ok(self.objects.get(storage_key).await?)
    }

    async fn upload(&self, input: &AttachmentInput, key: String) -> Result<Attachment, SendError> {
        let size = input.content.len() as u64;

        self.objects
            .put(&key, Bytes::copy_from_slice(&input.content), &input.content_type)
            .await
            .map_err(|source| SendError::AttachmentUploadFailed {
                filename: input.filename.clone(),
                source,
            })?;

        tracing::debug!(key = %key, size, "Attachment uploaded");

        Ok(Attachment {
            filename: input.filename.clone(),
            storage_key: key,
            content_type: input.content_type.clone(),
            size,
            uploaded_at: Utc::now(),
        })
    }

    async fn delete_keys(&self, keys: &[String]) {
        let results = join_all(keys.iter().map(|key| self.objects.delete(key))).await;
        for (key, result) in keys.iter().zip(results) {
            if let Err(e) = result {
                tracing::error!(key = %key, error = %e, "Failed to delete attachment object");
            }
        }
    }
}
