use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Upload of {key} failed: {message}")]
    Upload { key: String, message: String },

    #[error("Download of {key} failed: {message}")]
    Download { key: String, message: String },

    #[error("Delete of {key} failed: {message}")]
    Delete { key: String, message: String },

    #[error("Listing {prefix} failed: {message}")]
    List { prefix: String, message: String },

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Storage configuration error: {0}")]
    Config(String),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
