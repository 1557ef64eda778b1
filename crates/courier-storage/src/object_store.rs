use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// An object fetched back from storage
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// Flat key/value blob storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `data` under `key`, overwriting any existing object
    async fn put(&self, key: &str, data: Bytes, content_type: &str) -> Result<()>;

    /// Read an object, `StorageError::NotFound` when absent
    async fn get(&self, key: &str) -> Result<StoredObject>;

    /// Delete an object; deleting a missing key succeeds
    async fn delete(&self, key: &str) -> Result<()>;

    /// Keys starting with `prefix`, in lexicographic order
    async fn list_by_prefix(&self, prefix: &str) -> Result<Vec<String>>;
}
