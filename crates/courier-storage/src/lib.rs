//! Object storage for attachment payloads
//!
//! [`ObjectStore`] is the capability the delivery pipeline consumes. The
//! `s3` feature provides an adapter for any S3-compatible service (AWS S3,
//! Cloudflare R2, MinIO); [`MemoryObjectStore`] keeps objects in process.

pub mod error;
pub mod memory;
pub mod object_store;

#[cfg(feature = "s3")]
pub mod s3;

pub use error::{Result, StorageError};
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectStore, StoredObject};

#[cfg(feature = "s3")]
pub use s3::{S3ObjectStore, S3Settings};
